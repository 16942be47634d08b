use crate::constants::POI_PROVIDER_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, Poi};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Category used when the interests match nothing in [`INTEREST_PATTERNS`].
pub const DEFAULT_CATEGORY: &str = "tourism.sights";

/// Interest pattern to Geoapify category, first match wins. Patterns run on
/// lowercased text and are anchored at word boundaries so short keys do not
/// fire inside unrelated words. Russian entries are stems.
const INTEREST_PATTERNS: &[(&str, &str)] = &[
    (r"\bмузе", "entertainment.museum"),
    (r"\bmuseums?\b", "entertainment.museum"),
    (r"\bгалере", "entertainment.art_gallery"),
    (r"\bgaller(?:y|ies)\b", "entertainment.art_gallery"),
    (r"\bstreet[ _-]?art\b", "entertainment.art_gallery"),
    (r"\bарт\b", "entertainment.art_gallery"),
    (r"\bпарк(?:и|а|ов|ам|ах|е|у|ом)?\b", "leisure.park"),
    (r"\bparks?\b", "leisure.park"),
    (r"\bкафе\b", "catering.cafe"),
    (r"\bкофе", "catering.cafe"),
    (r"\bcaf[eé]s?\b", "catering.cafe"),
    (r"\bcoffee\b", "catering.cafe"),
    (r"\bресторан", "catering.restaurant"),
    (r"\bед[аыу]\b", "catering.restaurant"),
    (r"\brestaurants?\b", "catering.restaurant"),
    (r"\bfood\b", "catering.restaurant"),
    (r"\bбиблиотек", "education.library"),
    (r"\blibrar(?:y|ies)\b", "education.library"),
    (r"\bкниг", "commercial.books"),
    (r"\bbooks?\b", "commercial.books"),
    (r"\bпанорам", "tourism.attraction.viewpoint"),
    (r"\bвидов", "tourism.attraction.viewpoint"),
    (r"\bсмотров", "tourism.attraction.viewpoint"),
    (r"\bviewpoints?\b", "tourism.attraction.viewpoint"),
    (r"\bviews?\b", "tourism.attraction.viewpoint"),
    (r"\bдостопримечательн", "tourism.sights"),
    (r"\bsights?(?:eeing)?\b", "tourism.sights"),
];

static INTEREST_CATEGORIES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    INTEREST_PATTERNS
        .iter()
        .map(|(pattern, category)| (Regex::new(pattern).expect("valid interest pattern"), *category))
        .collect()
});

/// Map free-text interests to a provider category.
pub fn category_for_interests(interests: &str) -> &'static str {
    let text = interests.to_lowercase();
    INTEREST_CATEGORIES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&text))
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Source of candidate POIs around a point.
#[async_trait]
pub trait PoiProvider: Send + Sync {
    async fn fetch_candidates(
        &self,
        center: &Coordinates,
        interests: &str,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
    geometry: Option<PointGeometry>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    formatted: Option<String>,
    address_line2: Option<String>,
    /// Usually a list of tags; only a plain string is usable as text.
    details: Option<Value>,
    #[serde(default)]
    categories: Vec<String>,
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// `[lon, lat]`
    coordinates: Vec<f64>,
}

impl Feature {
    fn into_poi(self) -> Option<Poi> {
        let geometry = self.geometry?;
        let (lon, lat) = match geometry.coordinates.as_slice() {
            [lon, lat, ..] => (*lon, *lat),
            _ => return None,
        };
        let coordinates = match Coordinates::new(lat, lon) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Skipping Geoapify feature with bad geometry: {}", e);
                return None;
            }
        };

        let props = self.properties;
        let description = props
            .address_line2
            .filter(|s| !s.trim().is_empty())
            .or_else(|| match props.details {
                Some(Value::String(s)) => Some(s),
                _ => None,
            })
            .unwrap_or_default();

        Some(Poi {
            name: props.name.filter(|s| !s.trim().is_empty()),
            title: props.formatted.filter(|s| !s.trim().is_empty()),
            label: None,
            description,
            coordinates,
            category: props.categories.into_iter().next(),
            url: props.website,
        })
    }
}

/// Geoapify Places API client.
#[derive(Clone)]
pub struct GeoapifyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeoapifyClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, crate::constants::GEOAPIFY_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        GeoapifyClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PoiProvider for GeoapifyClient {
    async fn fetch_candidates(
        &self,
        center: &Coordinates,
        interests: &str,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>> {
        let category = category_for_interests(interests);
        let url = format!("{}/v2/places", self.base_url);

        tracing::debug!(
            category = %category,
            radius_m = radius_m,
            "Geoapify places request: {} within {}m",
            category, radius_m
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("categories", category.to_string()),
                (
                    "filter",
                    format!("circle:{},{},{}", center.lon, center.lat, radius_m),
                ),
                ("bias", format!("proximity:{},{}", center.lon, center.lat)),
                ("limit", limit.to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .timeout(Duration::from_secs(POI_PROVIDER_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| AppError::PoiProvider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                category = %category,
                "Geoapify HTTP error {}: {}",
                status, error_text
            );
            return Err(AppError::PoiProvider(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|e| AppError::PoiProvider(format!("Failed to parse response: {}", e)))?;

        let total = collection.features.len();
        let pois: Vec<Poi> = collection
            .features
            .into_iter()
            .filter_map(Feature::into_poi)
            .collect();

        tracing::info!(
            category = %category,
            returned = total,
            usable = pois.len(),
            "Geoapify returned {} features, {} usable",
            total, pois.len()
        );

        Ok(pois)
    }

    fn backend_name(&self) -> &'static str {
        "geoapify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_mapping() {
        assert_eq!(category_for_interests("Музеи и история"), "entertainment.museum");
        assert_eq!(category_for_interests("парки"), "leisure.park");
        assert_eq!(category_for_interests("street_art"), "entertainment.art_gallery");
        assert_eq!(category_for_interests("кафе, кофе"), "catering.cafe");
        assert_eq!(category_for_interests("Panorama VIEWS"), "tourism.attraction.viewpoint");
        assert_eq!(category_for_interests("что-нибудь"), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_short_keys_need_whole_words() {
        assert_eq!(category_for_interests("стартапы и видео"), DEFAULT_CATEGORY);
        assert_eq!(category_for_interests("interview spots"), DEFAULT_CATEGORY);
        assert_eq!(category_for_interests("парковка"), DEFAULT_CATEGORY);
        assert_eq!(category_for_interests("стрит-арт"), "entertainment.art_gallery");
        assert_eq!(category_for_interests("видовые точки"), "tourism.attraction.viewpoint");
        assert_eq!(category_for_interests("nice view"), "tourism.attraction.viewpoint");
    }

    #[test]
    fn test_museum_wins_over_later_keywords() {
        // "музей" is listed before "парк"
        assert_eq!(category_for_interests("парк и музей"), "entertainment.museum");
    }

    #[test]
    fn test_feature_conversion() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "name": "Nizhny Novgorod State Art Museum",
                        "formatted": "Verkhne-Volzhskaya Embankment 2",
                        "address_line2": "Verkhne-Volzhskaya Embankment 2, Nizhny Novgorod",
                        "details": ["details.contact"],
                        "categories": ["entertainment.museum", "building"],
                        "website": "https://example.org/museum"
                    },
                    "geometry": {"type": "Point", "coordinates": [44.0138, 56.3292]}
                },
                {
                    "type": "Feature",
                    "properties": {"formatted": "Chkalov Stairs", "details": "Monumental stairs"},
                    "geometry": {"type": "Point", "coordinates": [44.0090, 56.3302]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Broken"},
                    "geometry": {"type": "Point", "coordinates": [244.0, 56.0]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "No geometry"}
                }
            ]
        }))
        .unwrap();

        let pois: Vec<Poi> = collection
            .features
            .into_iter()
            .filter_map(Feature::into_poi)
            .collect();

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].display_name(), "Nizhny Novgorod State Art Museum");
        assert_eq!(pois[0].coordinates.lat, 56.3292);
        assert_eq!(pois[0].coordinates.lon, 44.0138);
        assert_eq!(pois[0].category.as_deref(), Some("entertainment.museum"));
        assert_eq!(pois[0].url.as_deref(), Some("https://example.org/museum"));
        assert!(pois[0].description.starts_with("Verkhne-Volzhskaya"));

        assert_eq!(pois[1].display_name(), "Chkalov Stairs");
        assert_eq!(pois[1].description, "Monumental stairs");
        assert_eq!(pois[1].category, None);
    }
}
