//! Composite health check over the database and cache collaborators.

use crate::models::{HealthReport, ProbeError, ProbeOutcome};
use crate::services::database::DatabaseProbe;
use crate::services::metrics::record_probe;
use crate::services::redis::CacheStore;
use std::sync::Arc;
use std::time::Instant;

pub const HEALTH_CHECK_KEY: &str = "health_check";
pub const HEALTH_CHECK_VALUE: &str = "ok";
pub const HEALTH_CHECK_TTL_SECONDS: u64 = 10;

#[derive(Clone)]
pub struct HealthChecker {
    database: Arc<dyn DatabaseProbe>,
    cache: Arc<dyn CacheStore>,
}

impl HealthChecker {
    pub fn new(database: Arc<dyn DatabaseProbe>, cache: Arc<dyn CacheStore>) -> Self {
        Self { database, cache }
    }

    /// Runs the database probe, then the cache probe, and folds both into a
    /// report. Never fails: every collaborator error ends up in the report.
    pub async fn check(&self) -> HealthReport {
        let mut report = HealthReport::default();

        let database = self.probe_database().await;
        report.record_database(&database);

        let cache = self.probe_cache().await;
        report.record_cache(&cache);

        if report.is_healthy() {
            tracing::info!("Health check passed");
        } else {
            tracing::warn!(
                database = ?report.database,
                cache = ?report.cache,
                error = report.error.as_deref().unwrap_or(""),
                "Health check failed"
            );
        }

        report
    }

    pub async fn probe_database(&self) -> ProbeOutcome {
        let start = Instant::now();

        let outcome = match self.database.health_check().await {
            Ok(()) => ProbeOutcome::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "Database probe failed");
                ProbeOutcome::Failed(ProbeError::Database(e.to_string()))
            }
        };

        record_probe("database", outcome.label(), start.elapsed());
        outcome
    }

    /// Writes the probe key with a short expiry and reads it back.
    pub async fn probe_cache(&self) -> ProbeOutcome {
        let start = Instant::now();

        let outcome = match self.write_and_read_back().await {
            Ok(Some(value)) if value == HEALTH_CHECK_VALUE => ProbeOutcome::Connected,
            Ok(observed) => {
                tracing::warn!(?observed, "Cache probe read back an unexpected value");
                ProbeOutcome::Mismatch { observed }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache probe failed");
                ProbeOutcome::Failed(ProbeError::Cache(e.to_string()))
            }
        };

        record_probe("cache", outcome.label(), start.elapsed());
        outcome
    }

    async fn write_and_read_back(&self) -> Result<Option<String>, anyhow::Error> {
        self.cache
            .set_cache(
                HEALTH_CHECK_KEY,
                HEALTH_CHECK_VALUE,
                HEALTH_CHECK_TTL_SECONDS,
            )
            .await?;
        self.cache.get_cache(HEALTH_CHECK_KEY).await
    }
}
