// Types shared by the LCU transport and the automation services

use serde::{Deserialize, Serialize};

/// Port and auth token of the running client's API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
  pub port: String,
  pub auth_token: String,
}

/// Connection snapshot returned by the health check. The token is never exposed here.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LcuStatus {
  pub connected: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub port: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Raw phase reported by `/lol-gameflow/v1/gameflow-phase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameflowPhase {
  None,
  Lobby,
  Matchmaking,
  ReadyCheck,
  ChampSelect,
  InProgress,
  Reconnect,
  WaitingForStats,
  PreEndOfGame,
  Other(String),
}

impl GameflowPhase {
  pub fn parse(raw: &str) -> Self {
    match raw {
      "None" | "" => Self::None,
      "Lobby" => Self::Lobby,
      "Matchmaking" => Self::Matchmaking,
      "ReadyCheck" => Self::ReadyCheck,
      "ChampSelect" => Self::ChampSelect,
      "InProgress" => Self::InProgress,
      "Reconnect" => Self::Reconnect,
      "WaitingForStats" => Self::WaitingForStats,
      "PreEndOfGame" => Self::PreEndOfGame,
      other => Self::Other(other.to_string()),
    }
  }
}

/// High-level client state used by the auto-accept engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClientState {
  NotInQueue,
  InQueue,
  MatchFound,
  ChampSelect,
  InGame,
  Unknown,
}

impl From<&GameflowPhase> for ClientState {
  fn from(phase: &GameflowPhase) -> Self {
    match phase {
      GameflowPhase::None | GameflowPhase::Lobby => ClientState::NotInQueue,
      GameflowPhase::Matchmaking => ClientState::InQueue,
      GameflowPhase::ReadyCheck => ClientState::MatchFound,
      GameflowPhase::ChampSelect => ClientState::ChampSelect,
      GameflowPhase::InProgress | GameflowPhase::Reconnect => ClientState::InGame,
      // Post-game screens count as idle
      GameflowPhase::WaitingForStats | GameflowPhase::PreEndOfGame => ClientState::NotInQueue,
      GameflowPhase::Other(_) => ClientState::Unknown,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum ReadyCheckState {
  InProgress,
  Accepted,
  Declined,
  #[serde(other)]
  Invalid,
}

/// `/lol-matchmaking/v1/ready-check`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyCheck {
  pub state: ReadyCheckState,
  #[serde(default)]
  pub player_response: String,
  #[serde(default)]
  pub decliner_ids: Vec<i64>,
  #[serde(default)]
  pub timer: f64,
}

impl ReadyCheck {
  /// True while the local player has not answered this ready check yet.
  pub fn awaiting_response(&self) -> bool {
    self.state == ReadyCheckState::InProgress
      && (self.player_response.is_empty() || self.player_response == "None")
  }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectAction {
  pub id: i64,
  pub actor_cell_id: i64,
  #[serde(default)]
  pub champion_id: i64,
  #[serde(default)]
  pub completed: bool,
  #[serde(default)]
  pub is_in_progress: bool,
  #[serde(default, rename = "type")]
  pub action_type: String,
}

/// `/lol-champ-select/v1/session`. Actions are grouped per phase: `actions[phase][n]`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectSession {
  #[serde(default)]
  pub actions: Vec<Vec<ChampSelectAction>>,
  pub local_player_cell_id: i64,
  #[serde(default)]
  pub is_spectating: bool,
}

/// Entry of `/lol-champions/v1/owned-champions-minimal`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Champion {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub alias: String,
  #[serde(default)]
  pub owned: bool,
  #[serde(default)]
  pub free_to_play: bool,
}

/// `/lol-summoner/v1/current-summoner`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSummoner {
  #[serde(default)]
  pub summoner_id: i64,
  #[serde(default)]
  pub puuid: String,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub game_name: String,
  #[serde(default)]
  pub tag_line: String,
  #[serde(default)]
  pub summoner_level: i64,
  #[serde(default)]
  pub profile_icon_id: i64,
}

impl CurrentSummoner {
  /// Display name, falling back to the Riot ID when the legacy name is empty.
  pub fn riot_display_name(&self) -> String {
    if !self.display_name.is_empty() {
      return self.display_name.clone();
    }
    if !self.game_name.is_empty() && !self.tag_line.is_empty() {
      return format!("{}#{}", self.game_name, self.tag_line);
    }
    if !self.game_name.is_empty() {
      return self.game_name.clone();
    }
    format!("User{}", self.summoner_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phase_classification_covers_every_phase() {
    let cases = [
      ("None", ClientState::NotInQueue),
      ("Lobby", ClientState::NotInQueue),
      ("Matchmaking", ClientState::InQueue),
      ("ReadyCheck", ClientState::MatchFound),
      ("ChampSelect", ClientState::ChampSelect),
      ("InProgress", ClientState::InGame),
      ("Reconnect", ClientState::InGame),
      ("WaitingForStats", ClientState::NotInQueue),
      ("PreEndOfGame", ClientState::NotInQueue),
      ("EndOfGame", ClientState::Unknown),
      ("TerminatedInError", ClientState::Unknown),
    ];
    for (raw, expected) in cases {
      assert_eq!(ClientState::from(&GameflowPhase::parse(raw)), expected, "phase {}", raw);
    }
  }

  #[test]
  fn ready_check_awaiting_response() {
    let rc: ReadyCheck =
      serde_json::from_str(r#"{"state":"InProgress","playerResponse":"None","timer":3.0}"#).unwrap();
    assert!(rc.awaiting_response());

    let rc: ReadyCheck =
      serde_json::from_str(r#"{"state":"InProgress","playerResponse":"Accepted"}"#).unwrap();
    assert!(!rc.awaiting_response());

    let rc: ReadyCheck = serde_json::from_str(r#"{"state":"Accepted","playerResponse":""}"#).unwrap();
    assert!(!rc.awaiting_response());

    let rc: ReadyCheck = serde_json::from_str(r#"{"state":"PartyNotReady"}"#).unwrap();
    assert_eq!(rc.state, ReadyCheckState::Invalid);
  }

  #[test]
  fn session_decodes_nested_actions() {
    let json = r#"{
      "localPlayerCellId": 2,
      "actions": [[
        {"id": 1, "actorCellId": 0, "championId": 0, "completed": false, "isInProgress": true, "type": "pick"},
        {"id": 3, "actorCellId": 2, "championId": 0, "completed": false, "isInProgress": false, "type": "pick"}
      ]]
    }"#;
    let session: ChampSelectSession = serde_json::from_str(json).unwrap();
    assert_eq!(session.local_player_cell_id, 2);
    assert_eq!(session.actions[0][1].id, 3);
    assert_eq!(session.actions[0][1].action_type, "pick");
  }

  #[test]
  fn summoner_display_name_fallbacks() {
    let mut s = CurrentSummoner {
      summoner_id: 42,
      puuid: String::new(),
      display_name: String::new(),
      game_name: "Faker".into(),
      tag_line: "KR1".into(),
      summoner_level: 1,
      profile_icon_id: 0,
    };
    assert_eq!(s.riot_display_name(), "Faker#KR1");
    s.tag_line.clear();
    assert_eq!(s.riot_display_name(), "Faker");
    s.game_name.clear();
    assert_eq!(s.riot_display_name(), "User42");
  }
}
