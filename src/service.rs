//! Calculation service client.
//!
//! The calculation service computes the authoritative footprint, writes an
//! analysis with recommendations and keeps each user's history.
//!
//! # Endpoints
//!
//! - `POST /api/footprint/calculate` - Calculate and store a month
//! - `GET /api/footprint/history/{userId}` - List a user's stored months
//! - `DELETE /api/footprint/{id}` - Delete a stored month
//!
//! No request is retried: every failure is reported to the caller as a
//! [`ServiceError`] naming the [`Operation`] that failed.

use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::model::{CalculationRequest, HistoryEntry, ServerResult};

/// Base URL of the calculation service when none is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// A call made to the calculation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Calculate,
    FetchHistory,
    Delete,
}

impl Operation {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Calculate => "calculate",
            Operation::FetchHistory => "fetch history",
            Operation::Delete => "delete",
        }
    }

    /// Message shown to the user when this operation fails.
    pub fn notice(&self) -> &'static str {
        match self {
            Operation::Calculate => "Error calculating footprint",
            Operation::FetchHistory => "Error fetching history",
            Operation::Delete => "Error deleting entry",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure talking to the calculation service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request never completed.
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation} returned status {status}")]
    Status {
        operation: Operation,
        status: StatusCode,
    },

    /// The service answered with a body that is not the expected JSON.
    #[error("{operation} returned a malformed body: {source}")]
    Malformed {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn operation(&self) -> Operation {
        match self {
            ServiceError::Transport { operation, .. }
            | ServiceError::Status { operation, .. }
            | ServiceError::Malformed { operation, .. } => *operation,
        }
    }
}

/// Client for the calculation service.
#[derive(Clone)]
pub struct CalculationClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for CalculationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationClient {
    /// Create a client for the default service URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_SERVICE_URL)
    }

    /// Create a client for a custom base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a month for calculation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = CalculationClient::with_base_url("http://localhost:8080");
    /// let request = CalculationRequest::new("user-001", 3, 2025, &input);
    /// let result = client.calculate(&request).await?;
    /// ```
    pub async fn calculate(&self, request: &CalculationRequest) -> Result<ServerResult, ServiceError> {
        let operation = Operation::Calculate;
        let url = format!("{}/api/footprint/calculate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let body = success_body(operation, response).await?;
        serde_json::from_str(&body).map_err(|source| ServiceError::Malformed { operation, source })
    }

    /// Fetch every stored month for a user, in the service's order.
    ///
    /// A body that is valid JSON but not an array yields an empty history.
    /// Array elements that are not objects are skipped.
    pub async fn fetch_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, ServiceError> {
        let operation = Operation::FetchHistory;
        let url = format!(
            "{}/api/footprint/history/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let body = success_body(operation, response).await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|source| ServiceError::Malformed { operation, source })?;

        Ok(history_entries(value))
    }

    /// Delete a stored month. Any success status, including 204, counts.
    pub async fn delete_entry(&self, id: &str) -> Result<(), ServiceError> {
        let operation = Operation::Delete;
        let url = format!(
            "{}/api/footprint/{}",
            self.base_url,
            urlencoding::encode(id)
        );

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status { operation, status });
        }

        Ok(())
    }
}

/// Read the body of a successful response.
async fn success_body(
    operation: Operation,
    response: reqwest::Response,
) -> Result<String, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Status { operation, status });
    }

    response
        .text()
        .await
        .map_err(|source| ServiceError::Transport { operation, source })
}

fn history_entries(value: Value) -> Vec<HistoryEntry> {
    let Value::Array(items) = value else {
        warn!("History response is not a list; treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<HistoryEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable history entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_notices() {
        assert_eq!(Operation::Calculate.notice(), "Error calculating footprint");
        assert_eq!(Operation::FetchHistory.notice(), "Error fetching history");
        assert_eq!(Operation::Delete.notice(), "Error deleting entry");
        assert_eq!(Operation::FetchHistory.to_string(), "fetch history");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = CalculationClient::with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");

        assert_eq!(CalculationClient::new().base_url(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_history_entries_non_array() {
        assert!(history_entries(json!({ "error": "nope" })).is_empty());
        assert!(history_entries(json!(null)).is_empty());
    }

    #[test]
    fn test_history_entries_skips_non_objects() {
        let entries = history_entries(json!([
            { "id": 1, "month": 2, "year": 2025, "totalCO2Kg": 300.0 },
            "garbage",
            { "id": 2, "month": 3, "year": 2025, "totalCO2Kg": 410.0 }
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id.as_deref(), Some("1"));
        assert_eq!(entries[1].total_co2_kg, Some(410.0));
    }

    #[test]
    fn test_status_error_names_operation() {
        let error = ServiceError::Status {
            operation: Operation::Delete,
            status: StatusCode::NOT_FOUND,
        };

        assert_eq!(error.operation(), Operation::Delete);
        assert_eq!(error.to_string(), "delete returned status 404 Not Found");
    }
}
