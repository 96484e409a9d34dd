// Background automation built on the LCU client

pub mod auto_accept;
pub mod auto_pick;
pub mod champion;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use auto_accept::{AutoAcceptEngine, PollIntervals};
pub use auto_pick::{AutoPickEngine, AutoPickSettings};
pub use champion::{find_champion_id, local_player_action, normalize_champion_name};
