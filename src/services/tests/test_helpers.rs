// Test helpers and a scripted fake of the League Client API

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::events::{EventSink, LcuEvent, StopReason};
use crate::lcu::{
    ChampSelectAction, ChampSelectSession, Champion, GameflowPhase, LcuApi, LcuError, ReadyCheck,
    ReadyCheckState,
};
use crate::services::PollIntervals;

/// Mutable script the fake answers from
pub struct FakeScript {
    pub phase: GameflowPhase,
    pub ready_check: Option<ReadyCheck>,
    pub session: Option<ChampSelectSession>,
    pub champions: Vec<Champion>,
    pub refuse_ready_check: bool,
    pub fail_accept: bool,
    pub champions_unavailable: bool,
}

#[derive(Default)]
pub struct FakeCalls {
    pub phase: usize,
    pub ready_check: usize,
    pub accept: usize,
    pub session: usize,
    pub select: Vec<(i64, i64)>,
    pub lock: Vec<i64>,
}

/// In-memory stand-in for the client. Accepting flips the player response like the real one.
pub struct FakeLcu {
    script: Mutex<FakeScript>,
    calls: Mutex<FakeCalls>,
}

impl FakeLcu {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(FakeScript {
                phase: GameflowPhase::None,
                ready_check: None,
                session: None,
                champions: default_champions(),
                refuse_ready_check: false,
                fail_accept: false,
                champions_unavailable: false,
            }),
            calls: Mutex::new(FakeCalls::default()),
        })
    }

    pub fn set_phase(&self, phase: &str) {
        self.script.lock().unwrap().phase = GameflowPhase::parse(phase);
    }

    pub fn set_ready_check(&self, ready_check: Option<ReadyCheck>) {
        self.script.lock().unwrap().ready_check = ready_check;
    }

    pub fn set_session(&self, session: Option<ChampSelectSession>) {
        self.script.lock().unwrap().session = session;
    }

    pub fn set_refuse_ready_check(&self, refuse: bool) {
        self.script.lock().unwrap().refuse_ready_check = refuse;
    }

    pub fn set_fail_accept(&self, fail: bool) {
        self.script.lock().unwrap().fail_accept = fail;
    }

    pub fn set_champions_unavailable(&self, unavailable: bool) {
        self.script.lock().unwrap().champions_unavailable = unavailable;
    }

    pub fn accepts(&self) -> usize {
        self.calls.lock().unwrap().accept
    }

    pub fn ready_check_calls(&self) -> usize {
        self.calls.lock().unwrap().ready_check
    }

    pub fn phase_calls(&self) -> usize {
        self.calls.lock().unwrap().phase
    }

    pub fn selects(&self) -> Vec<(i64, i64)> {
        self.calls.lock().unwrap().select.clone()
    }

    pub fn locks(&self) -> Vec<i64> {
        self.calls.lock().unwrap().lock.clone()
    }
}

impl LcuApi for FakeLcu {
    async fn gameflow_phase(&self) -> Result<GameflowPhase, LcuError> {
        self.calls.lock().unwrap().phase += 1;
        Ok(self.script.lock().unwrap().phase.clone())
    }

    async fn ready_check(&self) -> Result<ReadyCheck, LcuError> {
        self.calls.lock().unwrap().ready_check += 1;
        let (refuse, ready_check) = {
            let script = self.script.lock().unwrap();
            (script.refuse_ready_check, script.ready_check.clone())
        };
        if refuse {
            return Err(connection_refused().await);
        }
        ready_check.ok_or(LcuError::NotAvailable("ready check"))
    }

    async fn accept_ready_check(&self) -> Result<(), LcuError> {
        self.calls.lock().unwrap().accept += 1;
        let mut script = self.script.lock().unwrap();
        if script.fail_accept {
            return Err(LcuError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            });
        }
        if let Some(rc) = script.ready_check.as_mut() {
            rc.player_response = "Accepted".to_string();
        }
        Ok(())
    }

    async fn owned_champions(&self) -> Result<Vec<Champion>, LcuError> {
        let script = self.script.lock().unwrap();
        if script.champions_unavailable {
            return Err(LcuError::NotRunning("LeagueClientUx not running".to_string()));
        }
        Ok(script.champions.clone())
    }

    async fn champ_select_session(&self) -> Result<ChampSelectSession, LcuError> {
        self.calls.lock().unwrap().session += 1;
        self.script
            .lock()
            .unwrap()
            .session
            .clone()
            .ok_or_else(|| LcuError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                body: r#"{"message":"No active delegate"}"#.to_string(),
            })
    }

    async fn select_champion(&self, action_id: i64, champion_id: i64) -> Result<(), LcuError> {
        self.calls.lock().unwrap().select.push((action_id, champion_id));
        Ok(())
    }

    async fn lock_champion(&self, action_id: i64) -> Result<(), LcuError> {
        self.calls.lock().unwrap().lock.push(action_id);
        Ok(())
    }
}

/// A real connection-refused transport error, from dialing a port nobody listens on
pub async fn connection_refused() -> LcuError {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let err = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/", port))
        .send()
        .await
        .unwrap_err();
    LcuError::Transport(err)
}

pub fn default_champions() -> Vec<Champion> {
    [(145, "Kai'Sa", "Kaisa"), (64, "Lee Sin", "LeeSin"), (103, "Ahri", "Ahri")]
        .into_iter()
        .map(|(id, name, alias)| Champion {
            id,
            name: name.to_string(),
            alias: alias.to_string(),
            owned: true,
            free_to_play: false,
        })
        .collect()
}

/// Ready check waiting for the local player
pub fn pending_ready_check() -> ReadyCheck {
    ReadyCheck {
        state: ReadyCheckState::InProgress,
        player_response: "None".to_string(),
        decliner_ids: Vec::new(),
        timer: 3.0,
    }
}

pub fn finished_ready_check() -> ReadyCheck {
    ReadyCheck {
        state: ReadyCheckState::Accepted,
        player_response: "Accepted".to_string(),
        decliner_ids: Vec::new(),
        timer: 10.0,
    }
}

/// Session where cell 2 is the local player with action `action_id` in the first phase
pub fn session_for_local_player(action_id: i64) -> ChampSelectSession {
    let action = |id: i64, cell: i64| ChampSelectAction {
        id,
        actor_cell_id: cell,
        champion_id: 0,
        completed: false,
        is_in_progress: true,
        action_type: "pick".to_string(),
    };
    ChampSelectSession {
        actions: vec![vec![action(1, 0), action(action_id, 2), action(3, 4)]],
        local_player_cell_id: 2,
        is_spectating: false,
    }
}

/// Intervals long enough that the background worker never ticks during a test
pub fn idle_intervals() -> PollIntervals {
    PollIntervals {
        very_fast: Duration::from_secs(1000),
        fast: Duration::from_secs(2000),
        slow: Duration::from_secs(3000),
    }
}

/// Sink that keeps every event
pub fn recording_sink() -> (Arc<dyn EventSink>, Arc<Mutex<Vec<LcuEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    let sink: Arc<dyn EventSink> = Arc::new(move |e: LcuEvent| log.lock().unwrap().push(e));
    (sink, events)
}

pub fn stop_reasons(events: &Mutex<Vec<LcuEvent>>) -> Vec<StopReason> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            LcuEvent::AutoAcceptStopped { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}
