// Structured API call log entries delivered to the event sink

use std::collections::BTreeMap;
use std::time::Duration;

use base64::{engine::general_purpose, Engine};
use serde::Serialize;

/// Keep logged bodies short enough for a debug panel.
pub const MAX_LOGGED_BODY: usize = 2000;

/// One API call, LCU or Riot. `duration` is in milliseconds.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogEntry {
  #[serde(rename = "type")]
  pub kind: &'static str,
  pub method: String,
  pub endpoint: String,
  pub status_code: u16,
  pub duration: u64,
  pub timestamp: String,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub headers: BTreeMap<String, String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl ApiLogEntry {
  pub fn new(kind: &'static str, method: &str, endpoint: &str, elapsed: Duration) -> Self {
    Self {
      kind,
      method: method.to_string(),
      endpoint: endpoint.to_string(),
      status_code: 0,
      duration: elapsed.as_millis() as u64,
      timestamp: chrono::Utc::now().to_rfc3339(),
      headers: BTreeMap::new(),
      response: None,
      error: None,
    }
  }
}

/// `Basic base64("riot:<token>")`, the only form the token ever leaves the locator in.
pub fn basic_auth_header(token: &str) -> String {
  format!(
    "Basic {}",
    general_purpose::STANDARD.encode(format!("riot:{}", token))
  )
}

/// Headers as they are sent to the local client.
pub fn lcu_headers(token: &str) -> BTreeMap<String, String> {
  let mut headers = BTreeMap::new();
  headers.insert("Authorization".to_string(), basic_auth_header(token));
  headers.insert("Accept".to_string(), "application/json".to_string());
  headers
}

/// Riot API key masked down to its last four characters.
pub fn redact_api_key(key: &str) -> String {
  let tail: String = key
    .chars()
    .rev()
    .take(4)
    .collect::<Vec<_>>()
    .into_iter()
    .rev()
    .collect();
  format!("***{}", tail)
}

pub fn truncate_body(body: &str) -> String {
  if body.chars().count() <= MAX_LOGGED_BODY {
    return body.to_string();
  }
  let mut cut: String = body.chars().take(MAX_LOGGED_BODY).collect();
  cut.push_str("...(truncated)");
  cut
}
