// Sliding-window limiter for the Riot API (20 req/1s and 100 req/2min)

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// `limit` requests per trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
  pub limit: usize,
  pub window: Duration,
}

pub const SHORT_WINDOW: WindowLimit = WindowLimit {
  limit: 20,
  window: Duration::from_secs(1),
};

pub const LONG_WINDOW: WindowLimit = WindowLimit {
  limit: 100,
  window: Duration::from_secs(120),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowUsage {
  pub used: usize,
  pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
  pub short: WindowUsage,
  pub long: WindowUsage,
}

#[derive(Default)]
struct Windows {
  short: VecDeque<Instant>,
  long: VecDeque<Instant>,
}

/// Both windows must have room before a request goes out. Expired entries are pruned on every look.
pub struct RateLimiter {
  short: WindowLimit,
  long: WindowLimit,
  inner: Mutex<Windows>,
}

impl Default for RateLimiter {
  fn default() -> Self {
    Self::new()
  }
}

impl RateLimiter {
  /// Development key limits.
  pub fn new() -> Self {
    Self::with_limits(SHORT_WINDOW, LONG_WINDOW)
  }

  pub fn with_limits(short: WindowLimit, long: WindowLimit) -> Self {
    Self {
      short,
      long,
      inner: Mutex::new(Windows::default()),
    }
  }

  fn lock_pruned(&self, now: Instant) -> MutexGuard<'_, Windows> {
    let mut windows = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    prune(&mut windows.short, now, self.short.window);
    prune(&mut windows.long, now, self.long.window);
    windows
  }

  /// Time until both windows have a free slot; `None` when there is room now.
  fn wait_needed(&self, windows: &Windows, now: Instant) -> Option<Duration> {
    let short = wait_for(&windows.short, now, self.short);
    let long = wait_for(&windows.long, now, self.long);
    match (short, long) {
      (None, None) => None,
      (a, b) => Some(a.unwrap_or_default().max(b.unwrap_or_default())),
    }
  }

  /// Wait until a request is allowed, then record it. The lock is not held while sleeping.
  pub async fn acquire(&self) {
    loop {
      let wait = {
        let now = Instant::now();
        let mut windows = self.lock_pruned(now);
        match self.wait_needed(&windows, now) {
          None => {
            windows.short.push_back(now);
            windows.long.push_back(now);
            return;
          }
          Some(wait) => wait,
        }
      };

      tracing::debug!(wait_ms = wait.as_millis() as u64, "riot rate limit reached, waiting");
      tokio::time::sleep(wait).await;
    }
  }

  /// Record a request only if one is allowed right now.
  pub fn try_acquire(&self) -> bool {
    let now = Instant::now();
    let mut windows = self.lock_pruned(now);
    if self.wait_needed(&windows, now).is_some() {
      return false;
    }
    windows.short.push_back(now);
    windows.long.push_back(now);
    true
  }

  /// Would a request be allowed right now. Records nothing.
  pub fn can_acquire(&self) -> bool {
    let now = Instant::now();
    let windows = self.lock_pruned(now);
    self.wait_needed(&windows, now).is_none()
  }

  pub fn status(&self) -> RateLimitStatus {
    let windows = self.lock_pruned(Instant::now());
    RateLimitStatus {
      short: WindowUsage {
        used: windows.short.len(),
        limit: self.short.limit,
      },
      long: WindowUsage {
        used: windows.long.len(),
        limit: self.long.limit,
      },
    }
  }
}

fn prune(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
  while let Some(oldest) = entries.front() {
    if now.duration_since(*oldest) < window {
      break;
    }
    entries.pop_front();
  }
}

fn wait_for(entries: &VecDeque<Instant>, now: Instant, limit: WindowLimit) -> Option<Duration> {
  if entries.len() < limit.limit {
    return None;
  }
  let oldest = entries.front()?;
  Some((*oldest + limit.window).saturating_duration_since(now))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn short_window_spreads_a_burst() {
    let limiter = RateLimiter::new();
    let start = Instant::now();
    for _ in 0..25 {
      limiter.acquire().await;
    }
    assert!(start.elapsed() >= Duration::from_millis(250));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(limiter.status().short.used, 5);
    assert_eq!(limiter.status().long.used, 25);
  }

  #[tokio::test(start_paused = true)]
  async fn long_window_kicks_in_at_101st_call() {
    let limiter = RateLimiter::new();
    let start = Instant::now();
    for _ in 0..100 {
      limiter.acquire().await;
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!limiter.can_acquire());

    limiter.acquire().await;
    assert!(start.elapsed() >= Duration::from_secs(120));

    // Room again once the first second of the burst expired
    for _ in 0..4 {
      limiter.acquire().await;
    }
    assert!(start.elapsed() < Duration::from_secs(122));
  }

  #[tokio::test(start_paused = true)]
  async fn status_counts_each_acquire_once() {
    let limiter = RateLimiter::new();
    limiter.acquire().await;
    let before = limiter.status();
    limiter.acquire().await;
    let after = limiter.status();
    assert_eq!(after.short.used, before.short.used + 1);
    assert_eq!(after.long.used, before.long.used + 1);
    assert_eq!(after.short.limit, 20);
    assert_eq!(after.long.limit, 100);
  }

  #[tokio::test(start_paused = true)]
  async fn try_acquire_refuses_when_full_and_records_when_not() {
    let limiter = RateLimiter::with_limits(
      WindowLimit {
        limit: 2,
        window: Duration::from_secs(1),
      },
      WindowLimit {
        limit: 3,
        window: Duration::from_secs(10),
      },
    );
    assert!(limiter.try_acquire());
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
    assert_eq!(limiter.status().short.used, 2);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(limiter.can_acquire());
    assert_eq!(limiter.status().short.used, 0);
    assert!(limiter.try_acquire());
    // Long window is now full
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!limiter.try_acquire());
    assert_eq!(limiter.status().long.used, 3);
  }

  #[tokio::test(start_paused = true)]
  async fn windows_only_hold_live_entries() {
    let limiter = RateLimiter::new();
    for _ in 0..10 {
      limiter.acquire().await;
    }
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(limiter.status().short.used, 0);
    assert_eq!(limiter.status().long.used, 10);
    tokio::time::advance(Duration::from_secs(119)).await;
    assert_eq!(limiter.status().long.used, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn waiters_do_not_block_observers() {
    let limiter = std::sync::Arc::new(RateLimiter::with_limits(
      WindowLimit {
        limit: 1,
        window: Duration::from_secs(5),
      },
      LONG_WINDOW,
    ));
    limiter.acquire().await;
    let waiter = {
      let limiter = limiter.clone();
      tokio::spawn(async move { limiter.acquire().await })
    };
    tokio::task::yield_now().await;
    // Sleeping waiter holds no lock
    assert_eq!(limiter.status().short.used, 1);
    waiter.await.unwrap();
    assert_eq!(limiter.status().long.used, 2);
  }
}
