// Discovery and caching of the LCU port/token

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;
use std::process::Command;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::error::LcuError;
use super::types::ConnectionInfo;

pub const DEFAULT_CONNECTION_TTL: Duration = Duration::from_secs(30);

const PORT_FLAG: &str = "--app-port=";
const TOKEN_FLAG: &str = "--remoting-auth-token=";

/// Source of the client process command line.
pub trait ProcessInspector: Send + Sync {
  fn client_command_line(&self) -> Result<String, LcuError>;
}

/// Reads `LeagueClientUx` launch arguments from the OS process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessInspector;

impl ProcessInspector for SystemProcessInspector {
  #[cfg(target_os = "windows")]
  fn client_command_line(&self) -> Result<String, LcuError> {
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    let output = Command::new("wmic")
      .args([
        "process",
        "where",
        "name='LeagueClientUx.exe'",
        "get",
        "commandline",
      ])
      .creation_flags(CREATE_NO_WINDOW)
      .output()
      .map_err(|e| LcuError::NotRunning(format!("failed to query processes: {}", e)))?;

    if !output.status.success() {
      return Err(LcuError::NotRunning("LeagueClientUx.exe not running".into()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }

  #[cfg(not(target_os = "windows"))]
  fn client_command_line(&self) -> Result<String, LcuError> {
    let output = Command::new("ps")
      .args(["-A", "-o", "args="])
      .output()
      .map_err(|e| LcuError::NotRunning(format!("failed to query processes: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout
      .lines()
      .filter(|line| line.contains("LeagueClientUx"))
      .collect();
    if lines.is_empty() {
      return Err(LcuError::NotRunning("LeagueClientUx not running".into()));
    }
    Ok(lines.join("\n"))
  }
}

/// Extract port and auth token from the client's launch arguments.
pub fn parse_process_args(output: &str) -> Result<ConnectionInfo, LcuError> {
  let port = flag_value(output, PORT_FLAG, |c| c.is_ascii_digit())
    .ok_or_else(|| LcuError::NotRunning("league client not found".into()))?;
  let auth_token = flag_value(output, TOKEN_FLAG, |c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    .ok_or_else(|| LcuError::NotRunning("auth token not found".into()))?;

  Ok(ConnectionInfo { port, auth_token })
}

/// First non-empty value following `flag`.
fn flag_value(haystack: &str, flag: &str, allowed: impl Fn(char) -> bool) -> Option<String> {
  haystack.match_indices(flag).find_map(|(at, _)| {
    let value: String = haystack[at + flag.len()..]
      .chars()
      .take_while(|c| allowed(*c))
      .collect();
    (!value.is_empty()).then_some(value)
  })
}

#[derive(Debug, Clone)]
struct CachedConnection {
  info: ConnectionInfo,
  observed_at: Instant,
}

/// Resolves the client connection, caching it for `ttl`.
pub struct ConnectionLocator {
  inspector: Arc<dyn ProcessInspector>,
  ttl: Duration,
  cache: RwLock<Option<CachedConnection>>,
}

impl ConnectionLocator {
  pub fn new(inspector: Arc<dyn ProcessInspector>) -> Self {
    Self::with_ttl(inspector, DEFAULT_CONNECTION_TTL)
  }

  pub fn with_ttl(inspector: Arc<dyn ProcessInspector>, ttl: Duration) -> Self {
    Self {
      inspector,
      ttl,
      cache: RwLock::new(None),
    }
  }

  pub fn system() -> Self {
    Self::new(Arc::new(SystemProcessInspector))
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Cached connection if still within its TTL.
  pub fn cached(&self) -> Option<ConnectionInfo> {
    let guard = self.cache.read().unwrap_or_else(|e| e.into_inner());
    guard
      .as_ref()
      .filter(|c| c.observed_at.elapsed() < self.ttl)
      .map(|c| c.info.clone())
  }

  /// Fresh cached value, or a new discovery. Discovery failure empties the cache.
  pub async fn resolve(&self) -> Result<ConnectionInfo, LcuError> {
    if let Some(info) = self.cached() {
      return Ok(info);
    }

    let inspector = self.inspector.clone();
    let discovered = tokio::task::spawn_blocking(move || {
      inspector
        .client_command_line()
        .and_then(|out| parse_process_args(&out))
    })
    .await
    .map_err(|e| LcuError::NotRunning(format!("process discovery aborted: {}", e)))
    .and_then(|r| r);

    match discovered {
      Ok(info) => {
        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(CachedConnection {
          info: info.clone(),
          observed_at: Instant::now(),
        });
        tracing::debug!(port = %info.port, "discovered league client");
        Ok(info)
      }
      Err(err) => {
        self.invalidate();
        Err(err)
      }
    }
  }

  /// Forget the cached connection; the next `resolve` rediscovers.
  pub fn invalidate(&self) {
    let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
    *guard = None;
  }
}
