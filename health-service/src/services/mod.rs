//! Services layer for health-service.
//!
//! The health checker depends only on the `DatabaseProbe` and `CacheStore`
//! traits; production and mock implementations live next to them.

pub mod database;
pub mod health;
pub mod metrics;
pub mod redis;

pub use self::database::{Database, DatabaseProbe, MockDatabase};
pub use self::health::{
    HealthChecker, HEALTH_CHECK_KEY, HEALTH_CHECK_TTL_SECONDS, HEALTH_CHECK_VALUE,
};
pub use self::metrics::{get_metrics, init_metrics};
pub use self::redis::{CacheStore, CachedValue, MockCache, RedisService};
