// LCU module - discovery, health tracking and the HTTP transport for the League Client API

pub mod client;
pub mod connection;
pub mod error;
pub mod health;
pub mod logging;
pub mod types;

// Re-export public types and functions
pub use client::{spawn_health_monitor, LcuApi, LcuClient, LocalLcuApi};
pub use connection::{parse_process_args, ConnectionLocator, ProcessInspector, SystemProcessInspector};
pub use error::LcuError;
pub use health::{ConnectionHealth, HealthState};
pub use logging::ApiLogEntry;
pub use types::*;
