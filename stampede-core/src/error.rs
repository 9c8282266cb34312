use thiserror::Error;

/// Harness misconfiguration. Always raised before any request is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No concurrency tiers configured")]
    NoTiers,

    #[error("Tier at position {index} has size 0; tier sizes must be positive")]
    ZeroTier { index: usize },

    #[error("Workload has no operations")]
    EmptyWorkload,

    #[error("Invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Success rate must be within [0, 1], got {0}")]
    InvalidSuccessRate(f64),

    #[error("Operation {index} references unknown placeholder `{name}`")]
    UnknownPlaceholder { index: usize, name: String },

    #[error("Unterminated placeholder in template `{0}`")]
    UnterminatedPlaceholder(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to parse load plan: {0}")]
    Parse(#[from] toml::de::Error),
}
