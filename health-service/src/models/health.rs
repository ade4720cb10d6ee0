//! Health report returned by the probe endpoint.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Aggregate status of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Unhealthy,
}

/// Connection state of a single backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

/// A probe that raised an error rather than returning a wrong value.
///
/// The `Display` output is the exact fragment appended to the report's
/// `error` text. The cache fragment carries a leading space so that the two
/// messages read as one sentence when both fire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Database error: {0}")]
    Database(String),

    #[error(" Cache error: {0}")]
    Cache(String),
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected,
    /// The store answered, but the read-back did not match what was written.
    Mismatch { observed: Option<String> },
    Failed(ProbeError),
}

impl ProbeOutcome {
    pub fn connection_status(&self) -> ConnectionStatus {
        match self {
            ProbeOutcome::Connected => ConnectionStatus::Connected,
            ProbeOutcome::Mismatch { .. } | ProbeOutcome::Failed(_) => {
                ConnectionStatus::Disconnected
            }
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Connected => "connected",
            ProbeOutcome::Mismatch { .. } => "mismatch",
            ProbeOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthReport {
    #[schema(example = "healthy")]
    pub status: OverallStatus,
    #[schema(example = "connected")]
    pub database: ConnectionStatus,
    #[schema(example = "connected")]
    pub cache: ConnectionStatus,
    /// Present only when a probe failed with an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Database error: connection refused")]
    pub error: Option<String>,
}

impl Default for HealthReport {
    fn default() -> Self {
        Self {
            status: OverallStatus::Unhealthy,
            database: ConnectionStatus::Unknown,
            cache: ConnectionStatus::Unknown,
            error: None,
        }
    }
}

impl HealthReport {
    pub fn record_database(&mut self, outcome: &ProbeOutcome) {
        self.database = outcome.connection_status();
        self.append_error(outcome);
        self.refresh_status();
    }

    pub fn record_cache(&mut self, outcome: &ProbeOutcome) {
        self.cache = outcome.connection_status();
        self.append_error(outcome);
        self.refresh_status();
    }

    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }

    // A mismatch marks the store disconnected but contributes no text.
    fn append_error(&mut self, outcome: &ProbeOutcome) {
        if let ProbeOutcome::Failed(err) = outcome {
            self.error
                .get_or_insert_with(String::new)
                .push_str(&err.to_string());
        }
    }

    fn refresh_status(&mut self) {
        self.status = if self.database == ConnectionStatus::Connected
            && self.cache == ConnectionStatus::Connected
        {
            OverallStatus::Healthy
        } else {
            OverallStatus::Unhealthy
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(database: ProbeOutcome, cache: ProbeOutcome) -> HealthReport {
        let mut report = HealthReport::default();
        report.record_database(&database);
        report.record_cache(&cache);
        report
    }

    #[test]
    fn starts_unknown_and_not_healthy() {
        let report = HealthReport::default();
        assert_eq!(report.database, ConnectionStatus::Unknown);
        assert_eq!(report.cache, ConnectionStatus::Unknown);
        assert!(!report.is_healthy());
    }

    #[test]
    fn healthy_report_omits_error_field() {
        let report = report(ProbeOutcome::Connected, ProbeOutcome::Connected);

        assert_eq!(report.status_code(), StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"status": "healthy", "database": "connected", "cache": "connected"})
        );
    }

    #[test]
    fn database_failure_sets_message_without_leading_space() {
        let report = report(
            ProbeOutcome::Failed(ProbeError::Database("connection refused".into())),
            ProbeOutcome::Connected,
        );

        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "unhealthy",
                "database": "disconnected",
                "cache": "connected",
                "error": "Database error: connection refused"
            })
        );
    }

    #[test]
    fn cache_failure_alone_keeps_leading_space() {
        let report = report(
            ProbeOutcome::Connected,
            ProbeOutcome::Failed(ProbeError::Cache("timed out".into())),
        );

        assert_eq!(report.cache, ConnectionStatus::Disconnected);
        assert_eq!(report.error.as_deref(), Some(" Cache error: timed out"));
    }

    #[test]
    fn both_failures_concatenate_database_first() {
        let report = report(
            ProbeOutcome::Failed(ProbeError::Database("db down".into())),
            ProbeOutcome::Failed(ProbeError::Cache("cache down".into())),
        );

        assert_eq!(
            report.error.as_deref(),
            Some("Database error: db down Cache error: cache down")
        );
    }

    #[test]
    fn cache_mismatch_is_unhealthy_without_error_text() {
        let report = report(
            ProbeOutcome::Connected,
            ProbeOutcome::Mismatch {
                observed: Some("stale".into()),
            },
        );

        assert_eq!(report.cache, ConnectionStatus::Disconnected);
        assert_eq!(report.status, OverallStatus::Unhealthy);
        assert!(report.error.is_none());
        assert!(serde_json::to_value(&report)
            .unwrap()
            .get("error")
            .is_none());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(ProbeOutcome::Connected.label(), "connected");
        assert_eq!(ProbeOutcome::Mismatch { observed: None }.label(), "mismatch");
        assert_eq!(
            ProbeOutcome::Failed(ProbeError::Cache("x".into())).label(),
            "failed"
        );
    }
}
