//! Network transport seam for the response cache
//!
//! The cache decides *whether* to go to the network; a `Transport` decides
//! *how*. Production uses ureq; tests plug in canned responders.

use super::CachedRequest;
use crate::error::{FusionError, Result};
use serde_json::Value;
use std::time::Duration;

/// Performs one upstream request and returns the raw body bytes.
///
/// Implementations must turn any non-success response into an error rather
/// than returning the error page as a payload, so it never gets cached.
pub trait Transport: Send + Sync {
    /// Name of this transport (for logging)
    fn name(&self) -> &str;

    fn send(&self, request: &CachedRequest) -> Result<Vec<u8>>;
}

/// Largest body accepted from an upstream service
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Sync HTTP via ureq (no async runtime needed)
pub struct UreqTransport {
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // Status codes are mapped to FusionError below
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: make_agent(timeout),
        }
    }
}

/// Form/query values are sent as plain strings; JSON strings lose their quotes.
fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_param(v)))
            .collect(),
        _ => Vec::new(),
    }
}

impl Transport for UreqTransport {
    fn name(&self) -> &str {
        "ureq"
    }

    fn send(&self, request: &CachedRequest) -> Result<Vec<u8>> {
        let host = request.host().to_string();
        let query = pairs(&request.params);

        let result = match request.method.to_uppercase().as_str() {
            "GET" => {
                let mut req = self.agent.get(&request.url);
                for (k, v) in &query {
                    req = req.query(k, v);
                }
                req.call()
            }
            "POST" => {
                let mut req = self.agent.post(&request.url);
                for (k, v) in &query {
                    req = req.query(k, v);
                }
                match &request.body {
                    Value::Null => req.send_empty(),
                    body => req.send_form(pairs(body)),
                }
            }
            other => {
                return Err(FusionError::config(format!(
                    "unsupported HTTP method {}",
                    other
                )))
            }
        };

        let response = result.map_err(|e| FusionError::upstream(&host, e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            let snippet: String = error_text.chars().take(200).collect();
            return Err(FusionError::upstream(
                &host,
                format!("HTTP {} from {}: {}", status, request.url, snippet.trim()),
            ));
        }

        let mut body = response.into_body();
        body.with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| FusionError::upstream(&host, format!("failed to read body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_stringify_values() {
        let p = pairs(&json!({"species": 9606, "identifiers": "TP53\rMDM2", "flag": true}));
        assert!(p.contains(&("species".to_string(), "9606".to_string())));
        assert!(p.contains(&("identifiers".to_string(), "TP53\rMDM2".to_string())));
        assert!(p.contains(&("flag".to_string(), "true".to_string())));
    }

    #[test]
    fn test_pairs_of_non_object_is_empty() {
        assert!(pairs(&Value::Null).is_empty());
        assert!(pairs(&json!([1, 2])).is_empty());
    }
}
