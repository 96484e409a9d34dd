// Riot API - remote ranked/summoner data and the limiter every call goes through

pub mod client;
pub mod rate_limit;

pub use client::{Region, RiotClient, RiotError, RiotId, SummonerProfile};
pub use rate_limit::{RateLimitStatus, RateLimiter, WindowLimit, WindowUsage};
