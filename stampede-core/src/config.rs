use crate::{ConfigError, TierResult, DEFAULT_NAME, DEFAULT_TIERS, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use url::Url;

/// Configuration of one orchestrator run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadTestConfig {
    pub name: String,
    pub tiers: Vec<usize>,
    #[serde(default)]
    pub criterion: PassCriterion,
}

impl LoadTestConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tiers: DEFAULT_TIERS.to_vec(),
            criterion: PassCriterion::default(),
        }
    }

    /// Check the configuration and return the tiers as positive sizes, in order.
    pub fn validate(&self) -> Result<Vec<NonZeroUsize>, ConfigError> {
        self.criterion.validate()?;

        if self.tiers.is_empty() {
            return Err(ConfigError::NoTiers);
        }

        self.tiers
            .iter()
            .enumerate()
            .map(|(index, size)| NonZeroUsize::new(*size).ok_or(ConfigError::ZeroTier { index }))
            .collect()
    }
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

/// How a tier, and therefore a whole report, is judged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PassCriterion {
    /// Every virtual user of every tier must complete its whole workload.
    #[default]
    AllSucceeded,
    /// At least this fraction of the virtual users in each tier must succeed.
    MinSuccessRate(f64),
}

impl PassCriterion {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            PassCriterion::AllSucceeded => Ok(()),
            PassCriterion::MinSuccessRate(rate) if (0.0..=1.0).contains(&rate) => Ok(()),
            PassCriterion::MinSuccessRate(rate) => Err(ConfigError::InvalidSuccessRate(rate)),
        }
    }

    pub fn tier_passed(&self, tier: &TierResult) -> bool {
        match *self {
            PassCriterion::AllSucceeded => tier.failure_count() == 0,
            PassCriterion::MinSuccessRate(rate) => tier.success_rate() >= rate,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// What the response body must decode as for the operation to count as a success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decode {
    /// The body is not inspected.
    #[default]
    None,
    /// Any JSON document.
    Json,
    /// A single [`crate::Order`].
    Order,
    /// A JSON array of [`crate::Order`].
    OrderList,
}

/// Binds a value from the response body (located by JSON pointer) to a template variable
/// usable by later operations of the same virtual user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub var: String,
    pub pointer: String,
}

/// One HTTP-shaped step of a workload.
///
/// `path` and string values inside `body` are templates; see the `template` module of the
/// `stampede` crate for the placeholder syntax.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub method: Method,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "timeout_ms", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_status: Option<u16>,
    #[serde(default)]
    pub decode: Decode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<Capture>,
}

impl Operation {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
            timeout: None,
            expect_status: None,
            decode: Decode::None,
            captures: vec![],
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path).body(body)
    }

    pub fn put(path: &str, body: serde_json::Value) -> Self {
        Self::new(Method::Put, path).body(body)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the workload-wide transport timeout for this operation.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Require an exact status code instead of any 2xx.
    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect_status = Some(status);
        self
    }

    pub fn decode(mut self, decode: Decode) -> Self {
        self.decode = decode;
        self
    }

    pub fn capture(mut self, var: &str, pointer: &str) -> Self {
        self.captures.push(Capture {
            var: var.to_string(),
            pointer: pointer.to_string(),
        });
        self
    }

    /// Label used in outcomes, logs and metrics, e.g. `POST /orders`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A complete load test described in a TOML document.
///
/// ```toml
/// name = "orders"
/// base_url = "http://127.0.0.1:8080"
/// tiers = [1, 10, 100]
/// timeout_ms = 5000
///
/// [[operations]]
/// method = "GET"
/// path = "/orders"
/// decode = "order_list"
///
/// [[operations]]
/// method = "POST"
/// path = "/orders"
/// body = { id = "3", item = "Item 3", amount = 30 }
/// ```
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadPlan {
    #[serde(default = "default_name")]
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<usize>,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_timeout", rename = "timeout_ms")]
    pub timeout: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_success_rate: Option<f64>,
    pub operations: Vec<Operation>,
}

impl LoadPlan {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_test_config(&self) -> LoadTestConfig {
        let criterion = match self.min_success_rate {
            Some(rate) => PassCriterion::MinSuccessRate(rate),
            None => PassCriterion::AllSucceeded,
        };
        LoadTestConfig {
            name: self.name.clone(),
            tiers: self.tiers.clone(),
            criterion,
        }
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_tiers() -> Vec<usize> {
    DEFAULT_TIERS.to_vec()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// Parse the target's base address. A trailing slash is dropped so paths can be appended as-is.
pub fn parse_base_url(base_url: &str) -> Result<Url, ConfigError> {
    let trimmed = base_url.trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        });
    }

    Ok(url)
}
