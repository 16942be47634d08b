use crate::error::{AppError, Result};
use crate::models::{Coordinates, Poi, TransportMode};
use crate::services::llm::{ChatClient, ChatMessage, ChatReply};
use crate::services::structured::extract_structured;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

const OPTIMIZER_TEMPERATURE: f64 = 0.2;

const OPTIMIZER_SYSTEM_PROMPT: &str = "You plan short city walks. Order the given candidate \
places into one route from the start point that fits the time budget. Use only the candidates \
provided, keep their exact lat/lon, and drop places that do not fit. Answer with JSON only: \
{\"transport\": string, \"duration_min\": number, \"distance_km\": number, \
\"steps\": [{\"name\": string, \"lat\": number, \"lon\": number, \"description\": string}]}";

/// Everything an external optimizer gets to see.
#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub start: Coordinates,
    pub start_label: String,
    pub transport: TransportMode,
    pub total_minutes: u32,
    pub interests: String,
    pub candidates: Vec<Poi>,
    pub locale: String,
}

/// One step proposed by the optimizer; names may be missing or invented.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizedStep {
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub steps: Vec<OptimizedStep>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
}

/// Totals are informational only, so any JSON value is accepted for them.
#[derive(Debug, Deserialize)]
struct RawOptimizedRoute {
    #[serde(default)]
    steps: Vec<Value>,
    #[serde(default)]
    distance_km: Option<Value>,
    #[serde(default)]
    duration_min: Option<Value>,
}

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").expect("valid number regex"));

/// A number, or the first number inside a string such as `"2.1 km"`.
fn lenient_number(value: Option<Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => LEADING_NUMBER
            .find(&text)
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok()),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

impl OptimizedRoute {
    /// Parse a model reply. Steps without valid coordinates are dropped
    /// individually; `None` means the reply carried no route object at all.
    pub fn from_reply(reply: &Value) -> Option<Self> {
        let raw: RawOptimizedRoute = extract_structured(reply)?;
        let total = raw.steps.len();
        let steps: Vec<OptimizedStep> = raw
            .steps
            .into_iter()
            .filter_map(|step| serde_json::from_value(step).ok())
            .collect();

        if steps.len() < total {
            tracing::debug!(
                dropped = total - steps.len(),
                "Dropped {} optimizer steps without valid coordinates",
                total - steps.len()
            );
        }

        Some(OptimizedRoute {
            steps,
            distance_km: lenient_number(raw.distance_km),
            duration_min: lenient_number(raw.duration_min),
        })
    }
}

/// External service that proposes a stop ordering.
///
/// `Ok(None)` means the service answered but had nothing to propose; errors
/// cover transport failures, bad statuses and unparseable replies.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize(&self, request: &OptimizeRequest) -> Result<Option<OptimizedRoute>>;

    fn backend_name(&self) -> &'static str;
}

/// Optimizer backed by a chat-completion model on io.net.
pub struct IonetOptimizer {
    chat: ChatClient,
    model: String,
}

impl IonetOptimizer {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        IonetOptimizer {
            chat: ChatClient::new(api_key, base_url),
            model,
        }
    }

    fn build_prompt(request: &OptimizeRequest) -> Value {
        let candidates: Vec<Value> = request
            .candidates
            .iter()
            .map(|poi| {
                json!({
                    "name": poi.display_name(),
                    "lat": poi.coordinates.lat,
                    "lon": poi.coordinates.lon,
                    "description": poi.description,
                    "category": poi.category,
                })
            })
            .collect();

        json!({
            "start": {
                "lat": request.start.lat,
                "lon": request.start.lon,
                "label": request.start_label,
            },
            "transport": request.transport.to_string(),
            "time_minutes": request.total_minutes,
            "interests": request.interests,
            "locale": request.locale,
            "candidates": candidates,
        })
    }
}

#[async_trait]
impl RouteOptimizer for IonetOptimizer {
    async fn optimize(&self, request: &OptimizeRequest) -> Result<Option<OptimizedRoute>> {
        if request.candidates.is_empty() {
            return Ok(None);
        }

        let messages = [
            ChatMessage::system(OPTIMIZER_SYSTEM_PROMPT),
            ChatMessage::user(Self::build_prompt(request).to_string()),
        ];

        tracing::info!(
            model = %self.model,
            candidates = request.candidates.len(),
            "Requesting external route for {} candidates",
            request.candidates.len()
        );

        let content = match self
            .chat
            .complete(&self.model, &messages, OPTIMIZER_TEMPERATURE)
            .await?
        {
            ChatReply::Content(content) => content,
            ChatReply::RateLimited => {
                return Err(AppError::Optimizer("HTTP 429: rate limited".to_string()));
            }
        };

        let route = OptimizedRoute::from_reply(&content)
            .ok_or_else(|| AppError::Optimizer("Reply did not contain a route".to_string()))?;

        if route.steps.is_empty() {
            return Ok(None);
        }
        Ok(Some(route))
    }

    fn backend_name(&self) -> &'static str {
        "ionet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_fenced_reply() {
        let reply = json!(
            "Sure!\n```json\n{\"distance_km\": 2.1, \"steps\": [{\"name\": \"Kremlin\", \"lat\": 56.3287, \"lon\": 44.0020}]}\n```"
        );
        let route = OptimizedRoute::from_reply(&reply).unwrap();
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.steps[0].name.as_deref(), Some("Kremlin"));
        assert_eq!(route.distance_km, Some(2.1));
        assert_eq!(route.duration_min, None);
    }

    #[test]
    fn test_invalid_steps_are_dropped_individually() {
        let reply = json!({
            "steps": [
                {"name": "No coordinates"},
                {"name": "Bad latitude", "lat": 123.0, "lon": 44.0},
                {"name": "Stairs", "lat": 56.3302, "lon": 44.0090}
            ]
        });
        let route = OptimizedRoute::from_reply(&reply).unwrap();
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.steps[0].name.as_deref(), Some("Stairs"));
    }

    #[test]
    fn test_text_totals_do_not_hide_steps() {
        let reply = json!(
            "{\"duration_min\": \"about 90\", \"distance_km\": \"2,5 km\", \"steps\": [{\"name\": \"Kremlin\", \"lat\": 56.3287, \"lon\": 44.0020}]}"
        );
        let route = OptimizedRoute::from_reply(&reply).unwrap();
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.duration_min, Some(90.0));
        assert_eq!(route.distance_km, Some(2.5));

        let reply = json!({"duration_min": {"h": 1}, "distance_km": "far", "steps": [{"lat": 56.3287, "lon": 44.0020}]});
        let route = OptimizedRoute::from_reply(&reply).unwrap();
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.duration_min, None);
        assert_eq!(route.distance_km, None);
    }

    #[test]
    fn test_reply_without_object_is_none() {
        assert!(OptimizedRoute::from_reply(&json!("I cannot help with that")).is_none());
    }

    #[test]
    fn test_prompt_lists_candidates() {
        let start = Coordinates::new(56.3269, 44.0059).unwrap();
        let request = OptimizeRequest {
            start,
            start_label: "Minin Square".to_string(),
            transport: TransportMode::Walk,
            total_minutes: 120,
            interests: "музеи".to_string(),
            candidates: vec![Poi::new("Kremlin", Coordinates::new(56.3287, 44.0020).unwrap())],
            locale: "ru".to_string(),
        };

        let prompt = IonetOptimizer::build_prompt(&request);
        assert_eq!(prompt["time_minutes"], 120);
        assert_eq!(prompt["transport"], "walk");
        assert_eq!(prompt["candidates"][0]["name"], "Kremlin");
        assert_eq!(prompt["start"]["label"], "Minin Square");
    }
}
