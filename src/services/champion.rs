// Champion lookup and champ select helpers shared by the pick engine

use crate::lcu::{ChampSelectAction, ChampSelectSession, Champion, LcuError};

/// Lowercase and drop spaces, apostrophes and hyphens: "Kai'Sa" -> "kaisa".
pub fn normalize_champion_name(name: &str) -> String {
  name
    .to_lowercase()
    .chars()
    .filter(|c| !matches!(c, ' ' | '\'' | '-'))
    .collect()
}

/// Match `name` against display names and aliases. No match is an error, never id 0.
pub fn find_champion_id(champions: &[Champion], name: &str) -> Result<i64, LcuError> {
  let wanted = normalize_champion_name(name);
  if wanted.is_empty() {
    return Err(LcuError::ChampionNotFound(name.to_string()));
  }

  champions
    .iter()
    .find(|c| normalize_champion_name(&c.name) == wanted || normalize_champion_name(&c.alias) == wanted)
    .map(|c| c.id)
    .ok_or_else(|| LcuError::ChampionNotFound(name.to_string()))
}

/// The local player's action. Only the first phase is scanned.
pub fn local_player_action(session: &ChampSelectSession) -> Result<&ChampSelectAction, LcuError> {
  let first_phase = session
    .actions
    .first()
    .filter(|phase| !phase.is_empty())
    .ok_or(LcuError::NoActions)?;

  first_phase
    .iter()
    .find(|action| action.actor_cell_id == session.local_player_cell_id)
    .ok_or(LcuError::ActionNotFound(session.local_player_cell_id))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn champ(id: i64, name: &str, alias: &str) -> Champion {
    Champion {
      id,
      name: name.to_string(),
      alias: alias.to_string(),
      owned: true,
      free_to_play: false,
    }
  }

  fn action(id: i64, cell: i64) -> ChampSelectAction {
    ChampSelectAction {
      id,
      actor_cell_id: cell,
      champion_id: 0,
      completed: false,
      is_in_progress: true,
      action_type: "pick".to_string(),
    }
  }

  #[test]
  fn normalization_strips_punctuation() {
    assert_eq!(normalize_champion_name("Kai'Sa"), "kaisa");
    assert_eq!(normalize_champion_name("Lee Sin"), "leesin");
    assert_eq!(normalize_champion_name("Rek'Sai"), "reksai");
    assert_eq!(normalize_champion_name("Nunu-Willump"), "nunuwillump");
    // Only the three separators go, everything else stays
    assert_eq!(normalize_champion_name("Dr. Mundo"), "dr.mundo");
  }

  #[test]
  fn name_and_alias_resolve_to_same_id() {
    let champions = vec![
      champ(145, "Kai'Sa", "Kaisa"),
      champ(64, "Lee Sin", "LeeSin"),
      champ(36, "Dr. Mundo", "DrMundo"),
    ];
    let by_name = find_champion_id(&champions, "Kai'Sa").unwrap();
    let by_alias = find_champion_id(&champions, "kaisa").unwrap();
    let shouted = find_champion_id(&champions, "KAI SA").unwrap();
    assert_eq!(by_name, 145);
    assert_eq!(by_alias, by_name);
    assert_eq!(shouted, by_name);
    assert_eq!(find_champion_id(&champions, "drmundo").unwrap(), 36);
  }

  #[test]
  fn unknown_champion_is_an_error() {
    let champions = vec![champ(145, "Kai'Sa", "Kaisa")];
    let err = find_champion_id(&champions, "Notachamp").unwrap_err();
    assert!(matches!(err, LcuError::ChampionNotFound(ref n) if n == "Notachamp"));
    assert!(find_champion_id(&champions, " '-").is_err());
    assert!(find_champion_id(&[], "Kai'Sa").is_err());
  }

  #[test]
  fn local_action_comes_from_first_phase_only() {
    let session = ChampSelectSession {
      actions: vec![vec![action(1, 0), action(2, 3)], vec![action(9, 4)]],
      local_player_cell_id: 3,
      is_spectating: false,
    };
    assert_eq!(local_player_action(&session).unwrap().id, 2);

    // Present in a later phase only: still not found
    let later = ChampSelectSession {
      local_player_cell_id: 4,
      ..session
    };
    assert!(matches!(
      local_player_action(&later),
      Err(LcuError::ActionNotFound(4))
    ));
  }

  #[test]
  fn empty_session_has_no_actions() {
    let session = ChampSelectSession::default();
    assert!(matches!(local_player_action(&session), Err(LcuError::NoActions)));
  }
}
