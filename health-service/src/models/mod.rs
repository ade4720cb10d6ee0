mod health;

pub use health::{ConnectionStatus, HealthReport, OverallStatus, ProbeError, ProbeOutcome};
