use crate::constants::DEFAULT_MATRIX_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, TransportMode};
use crate::services::route_planner::sequencing::TravelTimeMatrix;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Source of pairwise travel times over a street network.
#[async_trait]
pub trait TravelTimeProvider: Send + Sync {
    /// Durations between every pair of `points`, in the same order.
    async fn matrix(&self, points: &[Coordinates], mode: TransportMode) -> Result<TravelTimeMatrix>;

    fn backend_name(&self) -> &'static str;
}

/// OSRM Table API response.
///
/// `durations[i][j]` is the travel time in seconds from the i-th to the j-th
/// coordinate, `None` when no route exists between the pair.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// `"Ok"` on success, otherwise e.g. `"InvalidQuery"` or `"NoTable"`.
    pub code: String,
    pub message: Option<String>,
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

impl TableResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

#[derive(Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OsrmClient {
    pub fn new(base_url: String) -> Self {
        OsrmClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_MATRIX_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn table_url(&self, points: &[Coordinates], mode: TransportMode) -> String {
        // OSRM wants "lon,lat;lon,lat;..."
        let coordinates = points
            .iter()
            .map(|c| format!("{},{}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}",
            self.base_url,
            mode.osrm_profile(),
            coordinates
        )
    }
}

#[async_trait]
impl TravelTimeProvider for OsrmClient {
    async fn matrix(&self, points: &[Coordinates], mode: TransportMode) -> Result<TravelTimeMatrix> {
        if points.len() < 2 {
            return Err(AppError::TravelTime(
                "At least 2 points required".to_string(),
            ));
        }

        let url = self.table_url(points, mode);
        tracing::debug!(
            points = points.len(),
            profile = %mode.osrm_profile(),
            "OSRM table request: {} points, profile {}",
            points.len(), mode.osrm_profile()
        );

        let response = self
            .client
            .get(&url)
            .query(&[("annotations", "duration")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::TravelTime(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                points = points.len(),
                "OSRM HTTP error {}: {}",
                status, error_text
            );
            return Err(AppError::TravelTime(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let table: TableResponse = response
            .json()
            .await
            .map_err(|e| AppError::TravelTime(format!("Failed to parse response: {}", e)))?;

        if !table.is_ok() {
            return Err(AppError::TravelTime(format!(
                "{}: {}",
                table.code,
                table.message.unwrap_or_default()
            )));
        }

        let matrix = TravelTimeMatrix::new(table.durations.unwrap_or_default());
        if !matrix.covers(points.len()) {
            return Err(AppError::TravelTime(format!(
                "Expected a {}x{} matrix, got {} rows",
                points.len(),
                points.len(),
                matrix.size()
            )));
        }

        Ok(matrix)
    }

    fn backend_name(&self) -> &'static str {
        "osrm"
    }
}
