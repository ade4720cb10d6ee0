pub mod health;
pub mod metrics;

pub use self::health::{health_check, readiness_check};
pub use self::metrics::metrics;
