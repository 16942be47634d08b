use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// Display name used when a POI carries no usable name field.
pub const PLACEHOLDER_POI_NAME: &str = "Unnamed place";

/// A candidate point of interest as delivered by a POI provider.
///
/// Providers disagree on which field holds the display name, so all three
/// common spellings are kept and resolved through [`Poi::display_name`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Poi {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Poi {
            name: Some(name.into()),
            title: None,
            label: None,
            description: String::new(),
            coordinates,
            category: None,
            url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// First non-blank of `name`, `title`, `label`, trimmed.
    /// `None` when the provider left all three empty.
    pub fn resolved_name(&self) -> Option<&str> {
        [&self.name, &self.title, &self.label]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Resolved name, or the shared placeholder.
    pub fn display_name(&self) -> &str {
        self.resolved_name().unwrap_or(PLACEHOLDER_POI_NAME)
    }
}
