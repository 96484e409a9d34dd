// Riot API client - account, summoner, ranked and mastery lookups behind the rate limiter

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::rate_limit::RateLimiter;
use crate::events::{EventSink, LcuEvent};
use crate::lcu::logging::{redact_api_key, truncate_body, ApiLogEntry};

pub const DEFAULT_REGION: &str = "vn2";

#[derive(Debug, thiserror::Error)]
pub enum RiotError {
  #[error("api key is required")]
  MissingApiKey,

  #[error("invalid Riot ID format. Use: gameName#tagLine")]
  InvalidRiotId,

  #[error("both game name and tag line are required")]
  IncompleteRiotId,

  #[error("riot request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("riot api error: {status} - {body}")]
  Status { status: StatusCode, body: String },

  #[error("failed to decode {what}: {source}")]
  Decode {
    what: &'static str,
    #[source]
    source: serde_json::Error,
  },
}

impl RiotError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
  }
}

/// `gameName#tagLine`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiotId {
  pub game_name: String,
  pub tag_line: String,
}

impl FromStr for RiotId {
  type Err = RiotError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let mut parts = raw.split('#');
    let (game_name, tag_line) = match (parts.next(), parts.next(), parts.next()) {
      (Some(game_name), Some(tag_line), None) => (game_name.trim(), tag_line.trim()),
      _ => return Err(RiotError::InvalidRiotId),
    };
    if game_name.is_empty() || tag_line.is_empty() {
      return Err(RiotError::IncompleteRiotId);
    }
    Ok(Self {
      game_name: game_name.to_string(),
      tag_line: tag_line.to_string(),
    })
  }
}

impl fmt::Display for RiotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.game_name, self.tag_line)
  }
}

/// Platform host plus the regional cluster it routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  pub platform: &'static str,
  pub routing: &'static str,
}

const REGIONS: &[(&str, &str)] = &[
  ("br1", "americas"),
  ("la1", "americas"),
  ("la2", "americas"),
  ("na1", "americas"),
  ("eun1", "europe"),
  ("euw1", "europe"),
  ("tr1", "europe"),
  ("ru", "europe"),
  ("me1", "europe"),
  ("jp1", "asia"),
  ("kr", "asia"),
  ("oc1", "sea"),
  ("sea", "sea"),
  ("sg2", "sea"),
  ("tw2", "sea"),
  ("vn2", "sea"),
];

impl Region {
  /// Unknown codes fall back to `vn2`.
  pub fn parse(code: &str) -> Self {
    let code = code.trim().to_ascii_lowercase();
    let (platform, routing) = REGIONS
      .iter()
      .find(|(platform, _)| *platform == code)
      .or_else(|| REGIONS.iter().find(|(platform, _)| *platform == DEFAULT_REGION))
      .copied()
      .unwrap_or(("vn2", "sea"));
    Self { platform, routing }
  }

  /// Account lookups are not served by the SEA cluster.
  pub fn account_routing(&self) -> &'static str {
    match self.routing {
      "sea" => "asia",
      other => other,
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub puuid: String,
  #[serde(default)]
  pub game_name: String,
  #[serde(default)]
  pub tag_line: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
  pub puuid: String,
  #[serde(default)]
  pub profile_icon_id: i64,
  #[serde(default)]
  pub revision_date: i64,
  #[serde(default)]
  pub summoner_level: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
  pub queue_type: String,
  #[serde(default)]
  pub tier: String,
  #[serde(default)]
  pub rank: String,
  #[serde(default)]
  pub league_points: i64,
  #[serde(default)]
  pub wins: i64,
  #[serde(default)]
  pub losses: i64,
  #[serde(default)]
  pub hot_streak: bool,
  #[serde(default)]
  pub veteran: bool,
  #[serde(default)]
  pub fresh_blood: bool,
  #[serde(default)]
  pub inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionMastery {
  pub champion_id: i64,
  #[serde(default)]
  pub champion_level: i64,
  #[serde(default)]
  pub champion_points: i64,
  #[serde(default)]
  pub champion_points_since_last_level: i64,
  #[serde(default)]
  pub champion_points_until_next_level: i64,
  #[serde(default)]
  pub last_play_time: i64,
  #[serde(default)]
  pub tokens_earned: i64,
}

/// Account and summoner merged for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerProfile {
  pub puuid: String,
  pub game_name: String,
  pub tag_line: String,
  pub profile_icon_id: i64,
  pub summoner_level: i64,
  pub revision_date: i64,
}

pub struct RiotClient {
  api_key: String,
  region: Region,
  http: reqwest::Client,
  limiter: Arc<RateLimiter>,
  sink: Option<Arc<dyn EventSink>>,
  base_url: Option<String>,
}

impl RiotClient {
  pub fn new(api_key: &str, region: &str, limiter: Arc<RateLimiter>) -> Result<Self, RiotError> {
    if api_key.trim().is_empty() {
      return Err(RiotError::MissingApiKey);
    }
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;

    Ok(Self {
      api_key: api_key.trim().to_string(),
      region: Region::parse(region),
      http,
      limiter,
      sink: None,
      base_url: None,
    })
  }

  pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  #[cfg(test)]
  pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
    self
  }

  pub fn region(&self) -> Region {
    self.region
  }

  pub fn limiter(&self) -> &Arc<RateLimiter> {
    &self.limiter
  }

  fn url(&self, host: &str, path: &str) -> String {
    match &self.base_url {
      Some(base) => format!("{}{}", base, path),
      None => format!("https://{}.api.riotgames.com{}", host, path),
    }
  }

  fn log_headers(&self) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("X-Riot-Token".to_string(), redact_api_key(&self.api_key));
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers
  }

  async fn get<T: DeserializeOwned>(&self, host: &str, path: &str, name: &'static str) -> Result<T, RiotError> {
    self.limiter.acquire().await;

    let started = Instant::now();
    let result = self.fetch(host, path).await;
    let elapsed = started.elapsed();

    let mut entry = ApiLogEntry::new("riot", "GET", name, elapsed);
    entry.headers = self.log_headers();
    match &result {
      Ok(body) => {
        entry.status_code = StatusCode::OK.as_u16();
        entry.response = Some(truncate_body(body));
        tracing::debug!(endpoint = name, elapsed_ms = elapsed.as_millis() as u64, "riot call");
      }
      Err(err) => {
        entry.status_code = match err {
          RiotError::Status { status, .. } => status.as_u16(),
          _ => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        };
        entry.error = Some(err.to_string());
        tracing::debug!(endpoint = name, error = %err, "riot call failed");
      }
    }
    if let Some(sink) = &self.sink {
      sink.notify(LcuEvent::ApiCall(entry));
    }

    let body = result?;
    serde_json::from_str(&body).map_err(|source| RiotError::Decode { what: name, source })
  }

  async fn fetch(&self, host: &str, path: &str) -> Result<String, RiotError> {
    let response = self
      .http
      .get(self.url(host, path))
      .header("X-Riot-Token", &self.api_key)
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(RiotError::Status { status, body });
    }
    Ok(body)
  }

  pub async fn account_by_riot_id(&self, riot_id: &RiotId) -> Result<Account, RiotError> {
    let path = format!(
      "/riot/account/v1/accounts/by-riot-id/{}/{}",
      utf8_percent_encode(&riot_id.game_name, NON_ALPHANUMERIC),
      utf8_percent_encode(&riot_id.tag_line, NON_ALPHANUMERIC)
    );
    self
      .get(self.region.account_routing(), &path, "account/by-riot-id")
      .await
  }

  pub async fn summoner_by_puuid(&self, puuid: &str) -> Result<Summoner, RiotError> {
    let path = format!(
      "/lol/summoner/v4/summoners/by-puuid/{}",
      utf8_percent_encode(puuid, NON_ALPHANUMERIC)
    );
    self.get(self.region.platform, &path, "summoner/by-puuid").await
  }

  pub async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, RiotError> {
    let path = format!(
      "/lol/league/v4/entries/by-puuid/{}",
      utf8_percent_encode(puuid, NON_ALPHANUMERIC)
    );
    self.get(self.region.platform, &path, "league/by-puuid").await
  }

  pub async fn top_masteries(&self, puuid: &str, count: u32) -> Result<Vec<ChampionMastery>, RiotError> {
    let path = format!(
      "/lol/champion-mastery/v4/champion-masteries/by-puuid/{}/top?count={}",
      utf8_percent_encode(puuid, NON_ALPHANUMERIC),
      count
    );
    self
      .get(self.region.platform, &path, "champion-mastery/top")
      .await
  }

  /// Resolve `gameName#tagLine` to an account, then its summoner.
  pub async fn search_by_riot_id(&self, raw: &str) -> Result<SummonerProfile, RiotError> {
    let riot_id: RiotId = raw.parse()?;
    let account = self.account_by_riot_id(&riot_id).await?;
    let summoner = self.summoner_by_puuid(&account.puuid).await?;

    Ok(SummonerProfile {
      puuid: account.puuid,
      game_name: account.game_name,
      tag_line: account.tag_line,
      profile_icon_id: summoner.profile_icon_id,
      summoner_level: summoner.summoner_level,
      revision_date: summoner.revision_date,
    })
  }
}
