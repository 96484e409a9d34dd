// Auto-accept engine - watches the gameflow phase and accepts ready checks

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::{EventSink, LcuEvent, NullSink, StopReason};
use crate::lcu::{ClientState, ConnectionHealth, LcuApi, LcuError};

/// Poll cadence per client state. Faster the closer a ready check is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
  /// Match found: acceptance is time-critical.
  pub very_fast: Duration,
  /// In queue, waiting for a match.
  pub fast: Duration,
  /// Everything else.
  pub slow: Duration,
}

impl Default for PollIntervals {
  fn default() -> Self {
    Self {
      very_fast: Duration::from_millis(200),
      fast: Duration::from_millis(500),
      slow: Duration::from_secs(3),
    }
  }
}

impl PollIntervals {
  pub fn for_state(&self, state: ClientState) -> Duration {
    match state {
      ClientState::MatchFound => self.very_fast,
      ClientState::InQueue => self.fast,
      _ => self.slow,
    }
  }
}

struct AcceptState {
  enabled: bool,
  auto_accept: bool,
  last_state: Option<ClientState>,
  consecutive_failures: u32,
  /// Accept already sent for the ready check currently on screen.
  accepted: bool,
  stop: CancellationToken,
  worker: Option<JoinHandle<()>>,
}

pub struct AutoAcceptEngine<C> {
  client: Arc<C>,
  health: Arc<ConnectionHealth>,
  sink: Arc<dyn EventSink>,
  intervals: PollIntervals,
  state: Mutex<AcceptState>,
}

impl<C> AutoAcceptEngine<C>
where
  C: LcuApi + Send + Sync + 'static,
{
  pub fn new(client: Arc<C>, health: Arc<ConnectionHealth>) -> Self {
    Self {
      client,
      health,
      sink: Arc::new(NullSink),
      intervals: PollIntervals::default(),
      state: Mutex::new(AcceptState {
        enabled: false,
        auto_accept: true,
        last_state: None,
        consecutive_failures: 0,
        accepted: false,
        stop: CancellationToken::new(),
        worker: None,
      }),
    }
  }

  pub fn with_intervals(mut self, intervals: PollIntervals) -> Self {
    self.intervals = intervals;
    self
  }

  /// Receives `AutoAcceptStopped` when the engine turns itself off.
  pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
    self.sink = sink;
    self
  }

  fn lock(&self) -> MutexGuard<'_, AcceptState> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn is_enabled(&self) -> bool {
    self.lock().enabled
  }

  pub fn auto_accept(&self) -> bool {
    self.lock().auto_accept
  }

  pub fn set_auto_accept(&self, enabled: bool) {
    self.lock().auto_accept = enabled;
    tracing::info!(enabled, "auto-accept toggled");
  }

  /// Last classified state; `Unknown` before the first successful poll.
  pub fn client_state(&self) -> ClientState {
    self.lock().last_state.unwrap_or(ClientState::Unknown)
  }

  pub fn consecutive_failures(&self) -> u32 {
    self.lock().consecutive_failures
  }

  /// Interval the worker should be ticking at right now.
  pub fn polling_interval(&self) -> Duration {
    self.intervals.for_state(self.client_state())
  }

  /// Spawn the background worker. No-op while already running.
  pub fn start(self: &Arc<Self>) {
    let mut state = self.lock();
    if state.enabled {
      return;
    }
    state.enabled = true;
    if state.stop.is_cancelled() {
      // Left cancelled by a self-disable
      state.stop = CancellationToken::new();
    }

    let engine = Arc::clone(self);
    let stop = state.stop.clone();
    state.worker = Some(tokio::spawn(async move { engine.run(stop).await }));
    tracing::info!("auto-accept engine started");
  }

  /// Stop the worker and wait for it. Safe to call when not running; the engine can be started again.
  pub async fn stop(&self) {
    let worker = {
      let mut state = self.lock();
      if !state.enabled {
        return;
      }
      state.enabled = false;
      state.stop.cancel();
      state.worker.take()
    };

    if let Some(worker) = worker {
      let _ = worker.await;
    }

    let mut state = self.lock();
    // A concurrent start may already have installed a fresh token
    if state.stop.is_cancelled() {
      state.stop = CancellationToken::new();
    }
    tracing::info!("auto-accept engine stopped");
  }

  async fn run(self: Arc<Self>, stop: CancellationToken) {
    let mut current = self.polling_interval();
    let mut ticker = ticker_for(current);

    loop {
      tokio::select! {
        biased;
        _ = stop.cancelled() => break,
        _ = ticker.tick() => {
          self.poll_once().await;

          let next = self.polling_interval();
          if next != current {
            tracing::debug!(from_ms = current.as_millis() as u64, to_ms = next.as_millis() as u64, "auto-accept cadence changed");
            current = next;
            ticker = ticker_for(current);
          }
        }
      }
    }
  }

  /// One poll cycle: classify the phase, then accept a pending ready check if there is one.
  pub async fn poll_once(&self) {
    {
      let state = self.lock();
      if !state.enabled || !state.auto_accept {
        return;
      }
    }

    if !self.health.is_connected() {
      tracing::trace!("auto-accept skipped, client disconnected");
      return;
    }

    let current = match self.client.gameflow_phase().await {
      Ok(phase) => ClientState::from(&phase),
      Err(err) => {
        tracing::debug!(error = %err, "failed to read gameflow phase");
        self.lock().consecutive_failures += 1;
        return;
      }
    };

    if self.observe_state(current) {
      tracing::info!("game started, disabling auto-accept");
      self.sink.notify(LcuEvent::AutoAcceptStopped {
        reason: StopReason::GameStarted,
      });
      return;
    }

    if matches!(current, ClientState::InQueue | ClientState::MatchFound) {
      self.check_ready_check().await;
    } else {
      let mut state = self.lock();
      state.consecutive_failures = 0;
      state.accepted = false;
    }
  }

  /// Record the new state. True when this is a transition into a game.
  fn observe_state(&self, current: ClientState) -> bool {
    let mut state = self.lock();
    let previous = state.last_state.replace(current);
    let game_started = matches!(previous, Some(p) if p != current) && current == ClientState::InGame;
    if game_started {
      state.auto_accept = false;
    }
    game_started
  }

  async fn check_ready_check(&self) {
    let ready_check = match self.client.ready_check().await {
      Ok(ready_check) => ready_check,
      Err(err) => {
        self.handle_error(&err);
        return;
      }
    };

    let should_accept = {
      let mut state = self.lock();
      state.consecutive_failures = 0;
      if !ready_check.awaiting_response() {
        state.accepted = false;
        false
      } else {
        !state.accepted
      }
    };
    if !should_accept {
      return;
    }

    match self.client.accept_ready_check().await {
      Ok(()) => {
        self.lock().accepted = true;
        tracing::info!("ready check accepted");
      }
      Err(err) => {
        tracing::warn!(error = %err, "failed to accept ready check");
        self.handle_error(&err);
      }
    }
  }

  fn handle_error(&self, err: &LcuError) {
    if err.is_not_found() {
      self.lock().consecutive_failures += 1;
      return;
    }
    if err.is_connection_refused() {
      self.disable_on_connection_error();
      return;
    }
    tracing::debug!(error = %err, "ready check poll failed");
  }

  fn disable_on_connection_error(&self) {
    let was_enabled = {
      let mut state = self.lock();
      let was_enabled = state.enabled;
      state.enabled = false;
      state.auto_accept = false;
      if was_enabled && !state.stop.is_cancelled() {
        state.stop.cancel();
      }
      was_enabled
    };

    if was_enabled {
      tracing::warn!("league client refused the connection, auto-accept disabled");
      self.sink.notify(LcuEvent::AutoAcceptStopped {
        reason: StopReason::ConnectionError,
      });
    }
  }
}

fn ticker_for(every: Duration) -> Interval {
  let mut ticker = interval_at(Instant::now() + every, every);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  ticker
}
