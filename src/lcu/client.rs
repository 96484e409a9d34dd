// LCU HTTP transport and typed endpoints

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::connection::ConnectionLocator;
use super::error::LcuError;
use super::health::ConnectionHealth;
use super::logging::{basic_auth_header, lcu_headers, truncate_body, ApiLogEntry};
use super::types::{
  ChampSelectSession, Champion, CurrentSummoner, GameflowPhase, LcuStatus, ReadyCheck,
};
use crate::events::{EventSink, LcuEvent};

pub const GAMEFLOW_PHASE: &str = "/lol-gameflow/v1/gameflow-phase";
pub const READY_CHECK: &str = "/lol-matchmaking/v1/ready-check";
pub const READY_CHECK_ACCEPT: &str = "/lol-matchmaking/v1/ready-check/accept";
pub const OWNED_CHAMPIONS: &str = "/lol-champions/v1/owned-champions-minimal";
pub const CHAMP_SELECT_SESSION: &str = "/lol-champ-select/v1/session";
pub const CURRENT_SUMMONER: &str = "/lol-summoner/v1/current-summoner";

/// Pseudo endpoint name used when logging health checks.
const HEALTH_CHECK_ENDPOINT: &str = "GetLCUStatus";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client API operations the automation engines depend on.
#[trait_variant::make(LcuApi: Send)]
pub trait LocalLcuApi {
  async fn gameflow_phase(&self) -> Result<GameflowPhase, LcuError>;
  async fn ready_check(&self) -> Result<ReadyCheck, LcuError>;
  async fn accept_ready_check(&self) -> Result<(), LcuError>;
  async fn owned_champions(&self) -> Result<Vec<Champion>, LcuError>;
  async fn champ_select_session(&self) -> Result<ChampSelectSession, LcuError>;
  /// Hover/select `champion_id` on the given action.
  async fn select_champion(&self, action_id: i64, champion_id: i64) -> Result<(), LcuError>;
  /// Complete (lock) the given action.
  async fn lock_champion(&self, action_id: i64) -> Result<(), LcuError>;
}

pub struct LcuClient {
  locator: Arc<ConnectionLocator>,
  health: Arc<ConnectionHealth>,
  http: reqwest::Client,
  sink: Option<Arc<dyn EventSink>>,
  scheme: &'static str,
}

impl LcuClient {
  pub fn new(
    locator: Arc<ConnectionLocator>,
    health: Arc<ConnectionHealth>,
  ) -> Result<Self, LcuError> {
    Self::with_timeout(locator, health, DEFAULT_REQUEST_TIMEOUT)
  }

  pub fn with_timeout(
    locator: Arc<ConnectionLocator>,
    health: Arc<ConnectionHealth>,
    timeout: Duration,
  ) -> Result<Self, LcuError> {
    // The client serves a self-signed certificate on 127.0.0.1
    let http = reqwest::Client::builder()
      .danger_accept_invalid_certs(true)
      .timeout(timeout)
      .connect_timeout(Duration::from_secs(2))
      .pool_max_idle_per_host(2)
      .build()?;

    Ok(Self {
      locator,
      health,
      http,
      sink: None,
      scheme: "https",
    })
  }

  /// Send a structured log entry for every call to `sink`.
  pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  #[cfg(test)]
  pub(crate) fn with_scheme(mut self, scheme: &'static str) -> Self {
    self.scheme = scheme;
    self
  }

  pub fn locator(&self) -> &Arc<ConnectionLocator> {
    &self.locator
  }

  pub fn health(&self) -> &Arc<ConnectionHealth> {
    &self.health
  }

  /// Single request path for the Client API. Refuses to dispatch while health says disconnected.
  pub async fn call(
    &self,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
  ) -> Result<Vec<u8>, LcuError> {
    if !self.health.is_connected() {
      return Err(LcuError::NotConnected);
    }
    self.dispatch(method, path, body).await
  }

  async fn dispatch(
    &self,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
  ) -> Result<Vec<u8>, LcuError> {
    let started = Instant::now();

    let info = match self.locator.resolve().await {
      Ok(info) => info,
      Err(err) => {
        self.note_failure(&err);
        self.log_call(&method, path, started, None, Err(&err));
        return Err(err);
      }
    };

    let url = format!("{}://127.0.0.1:{}{}", self.scheme, info.port, path);
    let mut request = self
      .http
      .request(method.clone(), &url)
      .header(AUTHORIZATION, basic_auth_header(&info.auth_token))
      .header(ACCEPT, "application/json");
    if let Some(body) = body {
      request = request.json(&body);
    }

    let response = match request.send().await {
      Ok(response) => response,
      Err(e) => {
        self.locator.invalidate();
        let err = LcuError::Transport(e);
        self.note_failure(&err);
        self.log_call(&method, path, started, Some(&info.auth_token), Err(&err));
        return Err(err);
      }
    };

    let status = response.status();
    let bytes = match response.bytes().await {
      Ok(bytes) => bytes.to_vec(),
      Err(e) => {
        self.locator.invalidate();
        let err = LcuError::Transport(e);
        self.note_failure(&err);
        self.log_call(&method, path, started, Some(&info.auth_token), Err(&err));
        return Err(err);
      }
    };

    if !status.is_success() {
      let err = LcuError::Status {
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
      };
      self.log_call(&method, path, started, Some(&info.auth_token), Err(&err));
      return Err(err);
    }

    self.health.set_connected(true);
    self.log_call(
      &method,
      path,
      started,
      Some(&info.auth_token),
      Ok((status.as_u16(), &bytes[..])),
    );
    Ok(bytes)
  }

  fn note_failure(&self, err: &LcuError) {
    if err.marks_disconnected() {
      self.health.set_connected(false);
    }
  }

  fn log_call(
    &self,
    method: &Method,
    path: &str,
    started: Instant,
    token: Option<&str>,
    outcome: Result<(u16, &[u8]), &LcuError>,
  ) {
    let elapsed = started.elapsed();
    match &outcome {
      Ok((status, _)) => {
        tracing::debug!(%method, path, status, elapsed_ms = elapsed.as_millis() as u64, "lcu call")
      }
      Err(err) => {
        tracing::debug!(%method, path, error = %err, elapsed_ms = elapsed.as_millis() as u64, "lcu call failed")
      }
    }

    let Some(sink) = &self.sink else {
      return;
    };
    let mut entry = ApiLogEntry::new("lcu", method.as_str(), path, elapsed);
    if let Some(token) = token {
      entry.headers = lcu_headers(token);
    }
    match outcome {
      Ok((status, body)) => {
        entry.status_code = status;
        if !body.is_empty() {
          entry.response = Some(truncate_body(&String::from_utf8_lossy(body)));
        }
      }
      Err(err) => {
        entry.status_code = err.status_code();
        entry.error = Some(err.to_string());
      }
    }
    sink.notify(LcuEvent::ApiCall(entry));
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &'static str) -> Result<T, LcuError> {
    let bytes = self.call(Method::GET, path, None).await?;
    serde_json::from_slice(&bytes).map_err(|source| LcuError::Decode { what, source })
  }

  /// Health check. Always allowed through; it is what moves health back to connected.
  pub async fn check_connection(&self) -> LcuStatus {
    let started = Instant::now();
    let resolved = self.locator.resolve().await;
    self.health.set_connected(resolved.is_ok());

    let status = match &resolved {
      Ok(info) => LcuStatus {
        connected: true,
        port: Some(info.port.clone()),
        error: None,
      },
      Err(err) => LcuStatus {
        connected: false,
        port: None,
        error: Some(err.to_string()),
      },
    };

    if let Some(sink) = &self.sink {
      let mut entry = ApiLogEntry::new("lcu", "GET", HEALTH_CHECK_ENDPOINT, started.elapsed());
      match &resolved {
        Ok(info) => {
          entry.status_code = 200;
          entry.headers = lcu_headers(&info.auth_token);
        }
        Err(err) => {
          entry.status_code = 500;
          entry.error = Some(err.to_string());
        }
      }
      entry.response = serde_json::to_string_pretty(&status).ok();
      sink.notify(LcuEvent::ApiCall(entry));
    }

    status
  }

  pub async fn current_summoner(&self) -> Result<CurrentSummoner, LcuError> {
    self.get_json(CURRENT_SUMMONER, "summoner").await
  }
}

impl LcuApi for LcuClient {
  async fn gameflow_phase(&self) -> Result<GameflowPhase, LcuError> {
    let raw: String = self.get_json(GAMEFLOW_PHASE, "gameflow phase").await?;
    Ok(GameflowPhase::parse(&raw))
  }

  async fn ready_check(&self) -> Result<ReadyCheck, LcuError> {
    let bytes = self.call(Method::GET, READY_CHECK, None).await?;
    let text = String::from_utf8_lossy(&bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "None" || trimmed == "\"None\"" {
      return Err(LcuError::NotAvailable("ready check"));
    }
    serde_json::from_str(trimmed).map_err(|source| LcuError::Decode {
      what: "ready check",
      source,
    })
  }

  async fn accept_ready_check(&self) -> Result<(), LcuError> {
    self.call(Method::POST, READY_CHECK_ACCEPT, None).await?;
    Ok(())
  }

  async fn owned_champions(&self) -> Result<Vec<Champion>, LcuError> {
    self.get_json(OWNED_CHAMPIONS, "champions").await
  }

  async fn champ_select_session(&self) -> Result<ChampSelectSession, LcuError> {
    self.get_json(CHAMP_SELECT_SESSION, "champ select session").await
  }

  async fn select_champion(&self, action_id: i64, champion_id: i64) -> Result<(), LcuError> {
    let path = format!("{}/actions/{}", CHAMP_SELECT_SESSION, action_id);
    let body = serde_json::json!({ "championId": champion_id });
    self.call(Method::PATCH, &path, Some(body)).await?;
    Ok(())
  }

  async fn lock_champion(&self, action_id: i64) -> Result<(), LcuError> {
    let path = format!("{}/actions/{}/complete", CHAMP_SELECT_SESSION, action_id);
    self.call(Method::POST, &path, None).await?;
    Ok(())
  }
}

/// Run the health check every `every` until `stop` fires.
pub fn spawn_health_monitor(
  client: Arc<LcuClient>,
  every: Duration,
  stop: CancellationToken,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      tokio::select! {
        _ = stop.cancelled() => break,
        _ = ticker.tick() => {
          let status = client.check_connection().await;
          tracing::trace!(connected = status.connected, "health check");
        }
      }
    }
    tracing::debug!("health monitor stopped");
  })
}
