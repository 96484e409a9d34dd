// League client automation: connection discovery, auto-accept, auto-pick and Riot API access

pub mod config;
pub mod events;
pub mod lcu;
pub mod riot;
pub mod services;
