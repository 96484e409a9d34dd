// Observer interface for status changes and API call logs.
// The UI layer (or anything else) plugs in here instead of receiving raw callbacks.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::lcu::logging::ApiLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
  /// The client refused the connection; the engine disabled itself.
  ConnectionError,
  /// A game started, so ready-check polling no longer makes sense.
  GameStarted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LcuEvent {
  ConnectionChanged { connected: bool },
  AutoAcceptStopped { reason: StopReason },
  ApiCall(ApiLogEntry),
}

pub trait EventSink: Send + Sync {
  fn notify(&self, event: LcuEvent);
}

impl<F> EventSink for F
where
  F: Fn(LcuEvent) + Send + Sync,
{
  fn notify(&self, event: LcuEvent) {
    self(event)
  }
}

/// Drops every event. Used when nobody is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
  fn notify(&self, _event: LcuEvent) {}
}

/// Writes events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
  fn notify(&self, event: LcuEvent) {
    match event {
      LcuEvent::ConnectionChanged { connected } => {
        tracing::info!(connected, "league client connection changed");
      }
      LcuEvent::AutoAcceptStopped { reason } => {
        tracing::warn!(?reason, "auto-accept stopped");
      }
      LcuEvent::ApiCall(entry) => {
        tracing::debug!(
          kind = entry.kind,
          method = %entry.method,
          endpoint = %entry.endpoint,
          status = entry.status_code,
          duration_ms = entry.duration,
          error = entry.error.as_deref().unwrap_or(""),
          "api call"
        );
      }
    }
  }
}

/// Forwards events into a tokio channel so a consumer can drain them at its own pace.
#[derive(Debug, Clone)]
pub struct ChannelSink {
  tx: UnboundedSender<LcuEvent>,
}

impl ChannelSink {
  pub fn new() -> (Self, UnboundedReceiver<LcuEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl EventSink for ChannelSink {
  fn notify(&self, event: LcuEvent) {
    // Receiver gone means nobody cares anymore
    let _ = self.tx.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  #[test]
  fn closures_are_sinks() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let sink = move |_e: LcuEvent| {
      counter.fetch_add(1, Ordering::SeqCst);
    };
    sink.notify(LcuEvent::ConnectionChanged { connected: true });
    sink.notify(LcuEvent::ConnectionChanged { connected: false });
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn channel_sink_delivers_in_order() {
    let (sink, mut rx) = ChannelSink::new();
    sink.notify(LcuEvent::ConnectionChanged { connected: false });
    sink.notify(LcuEvent::AutoAcceptStopped {
      reason: StopReason::GameStarted,
    });
    assert!(matches!(
      rx.try_recv(),
      Ok(LcuEvent::ConnectionChanged { connected: false })
    ));
    assert!(matches!(
      rx.try_recv(),
      Ok(LcuEvent::AutoAcceptStopped {
        reason: StopReason::GameStarted
      })
    ));
    drop(rx);
    // Must not panic once the receiver is gone
    sink.notify(LcuEvent::ConnectionChanged { connected: true });
  }

  #[test]
  fn events_serialize_with_type_tag() {
    let json = serde_json::to_value(LcuEvent::AutoAcceptStopped {
      reason: StopReason::ConnectionError,
    })
    .unwrap();
    assert_eq!(json["event"], "auto-accept-stopped");
    assert_eq!(json["reason"], "connection_error");
  }
}
