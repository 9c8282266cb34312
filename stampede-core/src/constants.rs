use std::time::Duration;

/// Concurrency tiers used when a load test does not configure its own.
pub const DEFAULT_TIERS: [usize; 4] = [1, 10, 100, 1000];

/// Transport timeout applied to every request unless the operation overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name given to load tests built without one.
pub const DEFAULT_NAME: &str = "load-test";
