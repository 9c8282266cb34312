use serde_json::Value;
use stampede_core::{parse_base_url, ConfigError, Method};
use std::time::Duration;

/// HTTP client bound to the base address of the service under load.
///
/// Every request carries a bounded timeout so that a stuck connection surfaces as a
/// `Network` failure instead of stalling its tier.
#[derive(Clone, Debug)]
pub struct Target {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Target {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let url = parse_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: url.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self.client.request(to_reqwest(method), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        request.send().await
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths() {
        let target = Target::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(target.base_url(), "http://127.0.0.1:8080");
        assert_eq!(target.url("/orders"), "http://127.0.0.1:8080/orders");
        assert_eq!(target.url("orders/1"), "http://127.0.0.1:8080/orders/1");
    }

    #[test]
    fn keeps_base_path() {
        let target = Target::new("http://127.0.0.1:8080/api/v1", Duration::from_secs(1)).unwrap();
        assert_eq!(target.url("/orders"), "http://127.0.0.1:8080/api/v1/orders");
    }

    #[test]
    fn rejects_bad_base() {
        assert!(matches!(
            Target::new("orders", Duration::from_secs(1)),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
