//! HTTP execution for builder requests
//!
//! Failures never escape as errors: a transport error or a status >= 300
//! yields no body, and whatever response arrived is handed back so the
//! builder can keep it for inspection.

use crate::config::TransportOptions;
use crate::error::{RestError, RestResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Map, Value};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let truncated = if total > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// The raw response of the last request a builder made
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Status codes below 300 count as success
    pub fn is_success(&self) -> bool {
        self.status < 300
    }

    /// Decode the body as JSON, `None` when empty or malformed
    pub fn json(&self) -> Option<Value> {
        decode_body(&self.body)
    }
}

/// Outcome of one request
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Decoded body, present only for successful responses with JSON content
    pub body: Option<Value>,
    /// The response, when the transport got one
    pub response: Option<RawResponse>,
}

/// HTTP client wrapper bound to one connection's transport options
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
    options: TransportOptions,
}

impl HttpExecutor {
    /// Create a new HTTP client from transport options
    pub fn new(options: &TransportOptions) -> RestResult<Self> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("restmodel/{}", env!("CARGO_PKG_VERSION")));

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .default_headers(header_map(&options.headers)?);

        if let Some(timeout) = options.timeout()? {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout()? {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| RestError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            options: options.clone(),
        })
    }

    /// Send one request and classify the response
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &Map<String, Value>,
        payload: Option<&Value>,
    ) -> Execution {
        tracing::debug!("{} {}", method, endpoint);

        let mut request = self
            .client
            .request(method.clone(), endpoint)
            .query(&query_pairs(query));

        if let Some(token) = &self.options.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(auth) = &self.options.basic_auth {
            request = request.basic_auth(&auth.username, auth.password.as_ref());
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} {} failed: {}", method, endpoint, e);
                return Execution::default();
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read response body from {}: {}", endpoint, e);
                String::new()
            }
        };

        let raw = RawResponse {
            status,
            headers,
            body,
        };

        if !raw.is_success() {
            // Only the sanitized/truncated body is logged
            tracing::warn!("API error: {} - {}", status, sanitize_for_log(&raw.body));
            return Execution {
                body: None,
                response: Some(raw),
            };
        }

        Execution {
            body: raw.json(),
            response: Some(raw),
        }
    }
}

/// Decode a JSON body; empty, `null` or malformed bodies become `None`
pub fn decode_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(body) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to parse response JSON: {} - {}", e, sanitize_for_log(body));
            None
        }
    }
}

/// Flatten query parameters into `http_build_query` style pairs
///
/// Arrays become `key[0]`, objects `key[name]`, booleans `1`/`0`, and nulls
/// are left out.
pub fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        push_pairs(key.clone(), value, &mut pairs);
    }
    pairs
}

fn push_pairs(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((key, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(format!("{}[{}]", key, index), item, pairs);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                push_pairs(format!("{}[{}]", key, name), item, pairs);
            }
        }
    }
}

fn header_map(headers: &std::collections::BTreeMap<String, String>) -> RestResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RestError::Configuration(format!("invalid header name `{}`: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RestError::Configuration(format!("invalid value for header `{}`: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_query_pairs_flatten_like_http_build_query() {
        let pairs = query_pairs(&map(json!({
            "active": true,
            "archived": false,
            "ids": [3, 4],
            "filter": {"name": "bob"},
            "missing": null,
            "limit": 10
        })));

        assert!(pairs.contains(&("active".to_string(), "1".to_string())));
        assert!(pairs.contains(&("archived".to_string(), "0".to_string())));
        assert!(pairs.contains(&("ids[0]".to_string(), "3".to_string())));
        assert!(pairs.contains(&("ids[1]".to_string(), "4".to_string())));
        assert!(pairs.contains(&("filter[name]".to_string(), "bob".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(!pairs.iter().any(|(key, _)| key == "missing"));
    }

    #[test]
    fn test_decode_body_soft_failures() {
        assert_eq!(decode_body(""), None);
        assert_eq!(decode_body("   "), None);
        assert_eq!(decode_body("null"), None);
        assert_eq!(decode_body("<html>oops</html>"), None);
        assert_eq!(decode_body(r#"{"id":1}"#), Some(json!({"id": 1})));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "é".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 1000 bytes total]"));
        assert_eq!(sanitize_for_log("line\nbreak"), "linebreak");
    }

    #[test]
    fn test_raw_response_header_lookup_is_case_insensitive() {
        let response = RawResponse {
            status: 200,
            headers: vec![("x-total-count".to_string(), "57".to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("X-Total-Count"), Some("57"));
        assert!(response.is_success());
    }

    #[test]
    fn test_invalid_header_is_configuration_error() {
        let mut options = TransportOptions::default();
        options
            .headers
            .insert("Bad Header".to_string(), "value".to_string());
        assert!(matches!(
            HttpExecutor::new(&options),
            Err(RestError::Configuration(_))
        ));
    }

    #[test]
    fn test_negative_timeout_is_configuration_error() {
        let options = TransportOptions {
            timeout: Some(-1.0),
            ..TransportOptions::default()
        };
        assert!(matches!(
            HttpExecutor::new(&options),
            Err(RestError::Configuration(_))
        ));
    }
}
