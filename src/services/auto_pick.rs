// Auto-pick engine - accepts, hovers and locks a champion during champ select

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::champion::{find_champion_id, local_player_action};
use crate::lcu::{ConnectionHealth, LcuApi, LcuError, ReadyCheckState};

pub const DEFAULT_PICK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_ACCEPT_COOLDOWN: Duration = Duration::from_secs(10);

/// Which automations run, and for which champion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoPickSettings {
  pub auto_accept: bool,
  pub auto_pick: bool,
  pub auto_lock: bool,
  pub champion_id: Option<i64>,
}

impl Default for AutoPickSettings {
  fn default() -> Self {
    Self {
      auto_accept: true,
      auto_pick: true,
      auto_lock: true,
      champion_id: None,
    }
  }
}

#[derive(Default)]
struct PickState {
  enabled: bool,
  stopped: bool,
  settings: AutoPickSettings,
  pending_champion: Option<String>,
  last_accept: Option<Instant>,
  accepted: bool,
  picked: bool,
  locked: bool,
  worker: Option<JoinHandle<()>>,
}

pub struct AutoPickEngine<C> {
  client: Arc<C>,
  health: Arc<ConnectionHealth>,
  interval: Duration,
  accept_cooldown: Duration,
  stop: CancellationToken,
  state: Mutex<PickState>,
}

impl<C> AutoPickEngine<C>
where
  C: LcuApi + Send + Sync + 'static,
{
  pub fn new(client: Arc<C>, health: Arc<ConnectionHealth>) -> Self {
    Self {
      client,
      health,
      interval: DEFAULT_PICK_INTERVAL,
      accept_cooldown: DEFAULT_ACCEPT_COOLDOWN,
      stop: CancellationToken::new(),
      state: Mutex::new(PickState::default()),
    }
  }

  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  pub fn with_accept_cooldown(mut self, cooldown: Duration) -> Self {
    self.accept_cooldown = cooldown;
    self
  }

  fn lock(&self) -> MutexGuard<'_, PickState> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn is_enabled(&self) -> bool {
    self.lock().enabled
  }

  pub fn settings(&self) -> AutoPickSettings {
    self.lock().settings.clone()
  }

  /// Replace toggles and champion. A champion change restarts pick/lock progress.
  pub fn apply_settings(&self, settings: AutoPickSettings) {
    let mut state = self.lock();
    if state.settings.champion_id != settings.champion_id {
      state.picked = false;
      state.locked = false;
    }
    state.settings = settings;
  }

  pub fn set_auto_accept(&self, enabled: bool) {
    self.lock().settings.auto_accept = enabled;
  }

  pub fn set_auto_pick(&self, enabled: bool) {
    self.lock().settings.auto_pick = enabled;
  }

  pub fn set_auto_lock(&self, enabled: bool) {
    self.lock().settings.auto_lock = enabled;
  }

  pub fn set_champion_id(&self, champion_id: i64) {
    let mut state = self.lock();
    state.settings.champion_id = Some(champion_id);
    state.pending_champion = None;
    state.picked = false;
    state.locked = false;
  }

  /// Resolve `name` against the owned champion list and select it.
  pub async fn set_champion(&self, name: &str) -> Result<i64, LcuError> {
    let champions = self.client.owned_champions().await?;
    let champion_id = find_champion_id(&champions, name)?;
    self.set_champion_id(champion_id);
    tracing::info!(champion = name, champion_id, "auto-pick champion set");
    Ok(champion_id)
  }

  /// Remember `name` and resolve it on a later cycle, once the client can list champions.
  /// Champ select is left alone until then.
  pub fn set_champion_name(&self, name: &str) {
    self.lock().pending_champion = Some(name.to_string());
  }

  /// Champion name still waiting to be resolved.
  pub fn pending_champion(&self) -> Option<String> {
    self.lock().pending_champion.clone()
  }

  /// (picked, locked) for the current session.
  pub fn progress(&self) -> (bool, bool) {
    let state = self.lock();
    (state.picked, state.locked)
  }

  /// Spawn the worker. Stopping is final for this instance.
  pub fn start(self: &Arc<Self>) {
    let mut state = self.lock();
    if state.enabled {
      return;
    }
    if state.stopped {
      tracing::warn!("auto-pick engine was stopped, create a new one to restart");
      return;
    }
    state.enabled = true;

    let engine = Arc::clone(self);
    state.worker = Some(tokio::spawn(async move { engine.run().await }));
    tracing::info!("auto-pick engine started");
  }

  pub async fn stop(&self) {
    let worker = {
      let mut state = self.lock();
      if !state.enabled {
        return;
      }
      state.enabled = false;
      state.stopped = true;
      self.stop.cancel();
      state.worker.take()
    };

    if let Some(worker) = worker {
      let _ = worker.await;
    }
    tracing::info!("auto-pick engine stopped");
  }

  async fn run(self: Arc<Self>) {
    let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        biased;
        _ = self.stop.cancelled() => break,
        _ = ticker.tick() => self.poll_once().await,
      }
    }
  }

  /// One cycle: ready check first, then champ select.
  pub async fn poll_once(&self) {
    let settings = {
      let state = self.lock();
      if !state.enabled {
        return;
      }
      state.settings.clone()
    };

    if !self.health.is_connected() {
      return;
    }

    if settings.auto_accept {
      self.handle_ready_check().await;
    }

    if !self.resolve_pending_champion().await {
      return;
    }

    if settings.auto_pick || settings.auto_lock {
      // Re-read in case the champion was just resolved
      let settings = self.settings();
      self.handle_champ_select(&settings).await;
    }
  }

  /// Resolve a name queued by `set_champion_name`. False while it is still unresolved.
  async fn resolve_pending_champion(&self) -> bool {
    let Some(name) = self.pending_champion() else {
      return true;
    };

    let resolved = match self.client.owned_champions().await {
      Ok(champions) => find_champion_id(&champions, &name),
      Err(err) => {
        tracing::debug!(champion = %name, error = %err, "champion list not available yet");
        return false;
      }
    };

    let mut state = self.lock();
    if state.pending_champion.as_deref() != Some(name.as_str()) {
      // Replaced while the list was loading
      return state.pending_champion.is_none();
    }
    state.pending_champion = None;
    match resolved {
      Ok(champion_id) => {
        state.settings.champion_id = Some(champion_id);
        state.picked = false;
        state.locked = false;
        tracing::info!(champion = %name, champion_id, "auto-pick champion resolved");
      }
      Err(err) => tracing::warn!(champion = %name, error = %err, "auto-pick champion not found"),
    }
    true
  }

  async fn handle_ready_check(&self) {
    let ready_check = match self.client.ready_check().await {
      Ok(ready_check) => ready_check,
      Err(err) => {
        tracing::trace!(error = %err, "no ready check");
        return;
      }
    };

    let should_accept = {
      let mut state = self.lock();
      if ready_check.state != ReadyCheckState::InProgress {
        state.accepted = false;
        false
      } else {
        let cooled_down = state
          .last_accept
          .map_or(true, |at| at.elapsed() > self.accept_cooldown);
        !state.accepted && cooled_down
      }
    };
    if !should_accept {
      return;
    }

    match self.client.accept_ready_check().await {
      Ok(()) => {
        let mut state = self.lock();
        state.accepted = true;
        state.last_accept = Some(Instant::now());
        // New match, new pick/lock cycle
        state.picked = false;
        state.locked = false;
        tracing::info!("ready check accepted");
      }
      Err(err) => tracing::warn!(error = %err, "failed to accept ready check"),
    }
  }

  async fn handle_champ_select(&self, settings: &AutoPickSettings) {
    let session = match self.client.champ_select_session().await {
      Ok(session) => session,
      Err(_) => {
        let mut state = self.lock();
        state.picked = false;
        state.locked = false;
        return;
      }
    };

    let (picked, locked) = {
      let mut state = self.lock();
      state.accepted = false;
      (state.picked, state.locked)
    };

    let action = match local_player_action(&session) {
      Ok(action) => action,
      Err(err) => {
        tracing::warn!(error = %err, "no champ select action for local player");
        return;
      }
    };
    let action_id = action.id;
    if action.completed {
      // Locked in by hand
      if !locked {
        let mut state = self.lock();
        state.locked = true;
        state.picked = false;
      }
      return;
    }

    if settings.auto_pick && !picked && !locked {
      if let Some(champion_id) = settings.champion_id {
        match self.client.select_champion(action_id, champion_id).await {
          Ok(()) => {
            self.lock().picked = true;
            tracing::info!(action_id, champion_id, "champion selected");
          }
          Err(err) => tracing::warn!(error = %err, "failed to select champion"),
        }
      }
    }

    if settings.auto_lock && !locked {
      match self.client.lock_champion(action_id).await {
        Ok(()) => {
          let mut state = self.lock();
          state.locked = true;
          state.picked = false;
          tracing::info!(action_id, "champion locked");
        }
        Err(err) => tracing::warn!(error = %err, "failed to lock champion"),
      }
    }
  }
}
