/// Counter incremented for every successful operation. Labelled with `operation`.
pub const METRIC_REQUEST_SUCCESS: &str = "stampede_request_success";

/// Counter incremented for every failed operation. Labelled with `operation` and `kind`.
pub const METRIC_REQUEST_ERROR: &str = "stampede_request_error";

/// Histogram of per-operation latency in nanoseconds. Labelled with `operation`.
pub const METRIC_REQUEST_LATENCY: &str = "stampede_request_latency";

/// Gauge holding the wall-clock duration of the most recent tier, in seconds. Labelled with `tier`.
pub const METRIC_TIER_ELAPSED: &str = "stampede_tier_elapsed";
