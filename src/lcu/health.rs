// Connection health shared by every component that talks to the client

use std::sync::{Arc, Mutex};

use crate::events::{EventSink, LcuEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
  Unknown,
  Connected,
  Disconnected,
}

impl From<bool> for HealthState {
  fn from(connected: bool) -> Self {
    if connected {
      HealthState::Connected
    } else {
      HealthState::Disconnected
    }
  }
}

/// Tri-state connection tracker. Observers hear about real transitions only.
pub struct ConnectionHealth {
  state: Mutex<HealthState>,
  sink: Mutex<Option<Arc<dyn EventSink>>>,
}

impl Default for ConnectionHealth {
  fn default() -> Self {
    Self::new()
  }
}

impl ConnectionHealth {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(HealthState::Unknown),
      sink: Mutex::new(None),
    }
  }

  pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
    let health = Self::new();
    health.set_sink(sink);
    health
  }

  pub fn set_sink(&self, sink: Arc<dyn EventSink>) {
    *self.sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(sink);
  }

  pub fn state(&self) -> HealthState {
    *self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// `Unknown` counts as connected so the very first call may go out.
  pub fn is_connected(&self) -> bool {
    self.state() != HealthState::Disconnected
  }

  pub fn set_connected(&self, connected: bool) {
    let next = HealthState::from(connected);
    let changed = {
      let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
      let changed = *state != next;
      *state = next;
      changed
    };

    if !changed {
      return;
    }

    tracing::debug!(connected, "connection health changed");
    let sink = self.sink.lock().unwrap_or_else(|e| e.into_inner()).clone();
    if let Some(sink) = sink {
      sink.notify(LcuEvent::ConnectionChanged { connected });
    }
  }
}
