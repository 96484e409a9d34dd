// Error handling for the LCU transport and the services built on it

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LcuError {
  /// Client process or its launch arguments could not be found.
  #[error("league client not running: {0}")]
  NotRunning(String),

  /// Health tracker says the client is unreachable; the call was never sent.
  #[error("league client not connected")]
  NotConnected,

  #[error("lcu request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("lcu api error: {status} - {body}")]
  Status { status: StatusCode, body: String },

  /// Endpoint answered but the resource is absent (e.g. ready check outside matchmaking).
  #[error("lcu api error: 404 Not Found - {0} not available")]
  NotAvailable(&'static str),

  #[error("failed to decode {what}: {source}")]
  Decode {
    what: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("champion not found: {0}")]
  ChampionNotFound(String),

  #[error("no actions in champ select session")]
  NoActions,

  #[error("action not found for local player (cell {0})")]
  ActionNotFound(i64),
}

impl LcuError {
  /// Expected "nothing here right now" answers. They only bump soft counters.
  pub fn is_not_found(&self) -> bool {
    match self {
      Self::NotAvailable(_) => true,
      Self::Status { status, body } => {
        if *status == StatusCode::NOT_FOUND {
          return true;
        }
        let body = body.to_lowercase();
        body.contains("not attached") || body.contains("no active delegate")
      }
      _ => false,
    }
  }

  /// The client could not be reached at all.
  pub fn is_connection_refused(&self) -> bool {
    match self {
      Self::Transport(err) => err.is_connect(),
      _ => false,
    }
  }

  pub fn is_not_running(&self) -> bool {
    matches!(self, Self::NotRunning(_))
  }

  /// Failures that mean the client went away; these flip connection health.
  pub fn marks_disconnected(&self) -> bool {
    self.is_connection_refused() || self.is_not_running()
  }

  /// Status code to report in call logs.
  pub fn status_code(&self) -> u16 {
    match self {
      Self::Status { status, .. } => status.as_u16(),
      Self::NotAvailable(_) => StatusCode::NOT_FOUND.as_u16(),
      Self::Transport(err) => err
        .status()
        .map(|s| s.as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
      _ => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_not_found_family() {
    assert!(LcuError::NotAvailable("ready check").is_not_found());
    assert!(LcuError::Status {
      status: StatusCode::NOT_FOUND,
      body: String::new()
    }
    .is_not_found());
    assert!(LcuError::Status {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      body: r#"{"message":"Champ select service is Not Attached"}"#.into()
    }
    .is_not_found());
    assert!(LcuError::Status {
      status: StatusCode::BAD_REQUEST,
      body: "No active delegate".into()
    }
    .is_not_found());
    assert!(!LcuError::Status {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      body: "boom".into()
    }
    .is_not_found());
  }

  #[test]
  fn domain_errors_are_neither_refused_nor_not_found() {
    for err in [
      LcuError::ChampionNotFound("Nobody".into()),
      LcuError::NoActions,
      LcuError::ActionNotFound(3),
      LcuError::NotConnected,
    ] {
      assert!(!err.is_not_found());
      assert!(!err.is_connection_refused());
      assert!(!err.marks_disconnected());
    }
  }

  #[test]
  fn not_running_marks_disconnected_but_is_not_refused() {
    let err = LcuError::NotRunning("LeagueClientUx not running".into());
    assert!(err.marks_disconnected());
    assert!(!err.is_connection_refused());
    assert_eq!(err.status_code(), 500);
  }

  #[test]
  fn status_error_message_carries_body() {
    let err = LcuError::Status {
      status: StatusCode::FORBIDDEN,
      body: "nope".into(),
    };
    assert_eq!(err.to_string(), "lcu api error: 403 Forbidden - nope");
    assert_eq!(err.status_code(), 403);
  }
}
