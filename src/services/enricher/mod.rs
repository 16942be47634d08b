//! Stop description enrichment.
//!
//! Enrichers only ever rewrite `description`; stop order, names, coordinates
//! and timings pass through untouched.

pub mod heuristics;
pub mod templates;

pub use heuristics::{is_address_like, needs_enrichment};
pub use templates::fallback_description;

use crate::cache::{description_cache_key, DescriptionCache};
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::Stop;
use crate::services::llm::{ChatClient, ChatMessage, ChatReply};
use crate::services::structured::extract_structured;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const ENRICH_TEMPERATURE: f64 = 0.5;

const ENRICH_SYSTEM_PROMPT: &str = "You are a concise travel guide. For each place write one or \
two sentences in the requested language with concrete facts about this exact place at the given \
coordinates. Skip general city background, prices, opening hours, links and addresses.";

#[async_trait]
pub trait DescriptionEnricher: Send + Sync {
    async fn enrich(&self, stops: Vec<Stop>, interests: &str, locale: &str) -> Result<Vec<Stop>>;

    fn backend_name(&self) -> &'static str;
}

/// Indices of the stops worth enriching, capped at `max`.
fn enrichment_targets(stops: &[Stop], max: usize) -> Vec<usize> {
    stops
        .iter()
        .enumerate()
        .filter(|(_, stop)| needs_enrichment(stop))
        .map(|(i, _)| i)
        .take(max)
        .collect()
}

/// Fills weak descriptions from the offline templates only.
pub struct TemplateEnricher {
    max_per_call: usize,
}

impl TemplateEnricher {
    pub fn new(max_per_call: usize) -> Self {
        TemplateEnricher { max_per_call }
    }
}

#[async_trait]
impl DescriptionEnricher for TemplateEnricher {
    async fn enrich(&self, mut stops: Vec<Stop>, interests: &str, locale: &str) -> Result<Vec<Stop>> {
        for idx in enrichment_targets(&stops, self.max_per_call) {
            let stop = &mut stops[idx];
            stop.description = fallback_description(&stop.name, interests, locale);
        }
        Ok(stops)
    }

    fn backend_name(&self) -> &'static str {
        "templates"
    }
}

/// `descriptions` is required; an object without it is not a reply.
#[derive(Debug, Deserialize)]
struct EnrichmentReply {
    descriptions: Vec<Value>,
}

/// One accepted model answer.
#[derive(Debug, Clone, PartialEq)]
struct EnrichedItem {
    idx: usize,
    description: String,
}

impl EnrichedItem {
    fn from_value(value: &Value) -> Option<Self> {
        let idx = value.get("idx")?.as_f64()?;
        let description = value.get("description")?.as_str()?.trim();
        if idx < 0.0 || idx.fract() != 0.0 {
            return None;
        }
        if description.chars().count() < MIN_ACCEPTED_DESCRIPTION_CHARS {
            return None;
        }
        Some(EnrichedItem {
            idx: idx as usize,
            description: description.to_string(),
        })
    }
}

/// Chat-model enricher with a model pool, rate-limit backoff, an optional
/// description cache and template fallback.
pub struct LlmEnricher {
    chat: ChatClient,
    models: Vec<String>,
    max_per_call: usize,
    initial_backoff: Duration,
    cache: Option<Arc<dyn DescriptionCache>>,
}

impl LlmEnricher {
    /// `primary_model` is tried first, then the built-in fallback models.
    pub fn new(api_key: String, base_url: String, primary_model: Option<String>) -> Self {
        let mut models: Vec<String> = primary_model
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        for fallback in ENRICH_FALLBACK_MODELS {
            if !models.iter().any(|m| m == fallback) {
                models.push(fallback.to_string());
            }
        }

        LlmEnricher {
            chat: ChatClient::new(api_key, base_url).with_error(AppError::Enrichment),
            models,
            max_per_call: DEFAULT_ENRICH_MAX_PER_CALL,
            initial_backoff: Duration::from_millis(ENRICH_INITIAL_BACKOFF_MS),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn DescriptionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_per_call(mut self, max_per_call: usize) -> Self {
        self.max_per_call = max_per_call;
        self
    }

    /// Base delay after a 429; grows by [`ENRICH_BACKOFF_GROWTH`] per round.
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Walk the model pool up to [`ENRICH_ROUNDS`] times. A 429 sleeps with
    /// jitter before the next model; other failures, including replies
    /// without any acceptable description, move on immediately.
    async fn request_descriptions(&self, payload: &Value) -> Option<Vec<EnrichedItem>> {
        let messages = [
            ChatMessage::system(ENRICH_SYSTEM_PROMPT),
            ChatMessage::user(payload.to_string()),
        ];
        let mut delay = self.initial_backoff;

        for round in 0..ENRICH_ROUNDS {
            for model in &self.models {
                match self.chat.complete(model, &messages, ENRICH_TEMPERATURE).await {
                    Ok(ChatReply::Content(content)) => {
                        match extract_structured::<EnrichmentReply>(&content) {
                            Some(reply) => {
                                let items: Vec<EnrichedItem> = reply
                                    .descriptions
                                    .iter()
                                    .filter_map(EnrichedItem::from_value)
                                    .collect();
                                if !items.is_empty() {
                                    return Some(items);
                                }
                                tracing::debug!(model = %model, "Enrichment reply had no usable descriptions");
                            }
                            None => {
                                tracing::debug!(model = %model, "Enrichment reply had no descriptions list");
                            }
                        }
                    }
                    Ok(ChatReply::RateLimited) => {
                        let jitter =
                            Duration::from_millis((rand::random::<f64>() * ENRICH_MAX_JITTER_MS) as u64);
                        tracing::debug!(
                            model = %model,
                            round = round,
                            "Rate limited, backing off {:?}",
                            delay + jitter
                        );
                        tokio::time::sleep(delay + jitter).await;
                    }
                    Err(e) => {
                        tracing::warn!(model = %model, "Enrichment call failed: {}", e);
                    }
                }
            }
            delay = delay.mul_f64(ENRICH_BACKOFF_GROWTH);
        }

        None
    }

    async fn cache_lookup(&self, key: &str) -> Option<String> {
        match &self.cache {
            Some(cache) => cache.get_description(key).await,
            None => None,
        }
    }

    async fn cache_store(&self, key: &str, description: &str) {
        if let Some(cache) = &self.cache {
            cache.cache_description(key, description).await;
        }
    }
}

#[async_trait]
impl DescriptionEnricher for LlmEnricher {
    async fn enrich(&self, mut stops: Vec<Stop>, interests: &str, locale: &str) -> Result<Vec<Stop>> {
        let targets = enrichment_targets(&stops, self.max_per_call);
        if targets.is_empty() {
            return Ok(stops);
        }

        let mut pending: Vec<(usize, String)> = Vec::new();
        for idx in targets {
            let stop = &stops[idx];
            let key = description_cache_key(&stop.name, &stop.coordinates, locale, interests);
            match self.cache_lookup(&key).await {
                Some(cached) => stops[idx].description = cached,
                None => pending.push((idx, key)),
            }
        }
        if pending.is_empty() {
            return Ok(stops);
        }

        let places: Vec<Value> = pending
            .iter()
            .map(|(idx, _)| {
                let stop = &stops[*idx];
                json!({
                    "idx": idx,
                    "name": stop.name,
                    "lat": stop.coordinates.lat,
                    "lon": stop.coordinates.lon,
                })
            })
            .collect();
        let payload = json!({
            "locale": locale,
            "topic_hint": interests,
            "places": places,
            "instruction": format!(
                "Return only JSON of the form {{\"descriptions\": [{{\"idx\": number, \"description\": string}}]}}. Language: '{}'.",
                locale
            ),
        });

        match self.request_descriptions(&payload).await {
            Some(items) => {
                let mut applied = 0usize;
                for item in items {
                    if let Some((idx, key)) = pending.iter().find(|(idx, _)| *idx == item.idx) {
                        stops[*idx].description = item.description;
                        self.cache_store(key, &stops[*idx].description).await;
                        applied += 1;
                    }
                }
                tracing::debug!(
                    requested = pending.len(),
                    applied = applied,
                    "Applied {} of {} model descriptions",
                    applied, pending.len()
                );
            }
            None => {
                tracing::warn!(
                    stops = pending.len(),
                    "No model produced descriptions, using templates"
                );
                for (idx, key) in &pending {
                    let description = fallback_description(&stops[*idx].name, interests, locale);
                    self.cache_store(key, &description).await;
                    stops[*idx].description = description;
                }
            }
        }

        Ok(stops)
    }

    fn backend_name(&self) -> &'static str {
        "ionet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn stop(name: &str, description: &str) -> Stop {
        Stop::new(name, description, Coordinates::new(56.3287, 44.0020).unwrap())
    }

    #[test]
    fn test_model_pool_order() {
        let enricher = LlmEnricher::new(
            "key".to_string(),
            "http://localhost".to_string(),
            Some("custom/model".to_string()),
        );
        assert_eq!(enricher.models()[0], "custom/model");
        assert_eq!(enricher.models().len(), 1 + ENRICH_FALLBACK_MODELS.len());

        // A primary model that is already in the pool is not duplicated
        let enricher = LlmEnricher::new(
            "key".to_string(),
            "http://localhost".to_string(),
            Some(ENRICH_FALLBACK_MODELS[1].to_string()),
        );
        assert_eq!(enricher.models().len(), ENRICH_FALLBACK_MODELS.len());
    }

    #[test]
    fn test_enriched_item_validation() {
        let ok = EnrichedItem::from_value(&json!({"idx": 1.0, "description": "  A real sentence. "}));
        assert_eq!(
            ok,
            Some(EnrichedItem {
                idx: 1,
                description: "A real sentence.".to_string()
            })
        );
        assert!(EnrichedItem::from_value(&json!({"idx": 1, "description": "short"})).is_none());
        assert!(EnrichedItem::from_value(&json!({"idx": -1, "description": "Long enough text"})).is_none());
        assert!(EnrichedItem::from_value(&json!({"idx": "0", "description": "Long enough text"})).is_none());
    }

    #[test]
    fn test_reply_requires_descriptions_list() {
        let reply: Option<EnrichmentReply> =
            extract_structured(&json!("{\"error\": \"cannot comply\"}"));
        assert!(reply.is_none());

        let reply: Option<EnrichmentReply> =
            extract_structured(&json!({"descriptions": "not a list"}));
        assert!(reply.is_none());

        let reply: Option<EnrichmentReply> = extract_structured(&json!({"descriptions": []}));
        assert_eq!(reply.map(|r| r.descriptions.len()), Some(0));
    }

    #[test]
    fn test_targets_respect_cap() {
        let stops = vec![
            stop("A", ""),
            stop("B", "Red brick walls and towers above the river confluence."),
            stop("C", ""),
            stop("D", ""),
        ];
        assert_eq!(enrichment_targets(&stops, 2), vec![0, 2]);
        assert_eq!(enrichment_targets(&stops, 10), vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_template_enricher_only_touches_descriptions() {
        let stops = vec![
            stop("Кафе Мечта", ""),
            stop("Kremlin", "Red brick walls and towers above the river confluence."),
        ];
        let enricher = TemplateEnricher::new(4);

        let enriched = enricher.enrich(stops.clone(), "кофе", "ru").await.unwrap();

        assert_eq!(enriched.len(), 2);
        assert!(enriched[0].description.starts_with("Кафе Мечта: "));
        assert_eq!(enriched[1], stops[1]);
        assert_eq!(enriched[0].name, stops[0].name);
        assert_eq!(enriched[0].coordinates, stops[0].coordinates);
    }
}
