//! Fixed-window rate limiter for job dispatch.

use std::time::Duration;

use tokio::time::Instant;

/// Allows at most `max` acquisitions per `window`, sleeping callers past the
/// ceiling until the window rolls over. Protects the persistence layer from
/// dispatch bursts.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    window_start: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            window_start: Instant::now(),
            used: 0,
        }
    }

    /// Take one slot, waiting for the next window if the current one is
    /// exhausted.
    pub async fn acquire(&mut self) {
        loop {
            let now = Instant::now();
            if now.duration_since(self.window_start) >= self.window {
                self.window_start = now;
                self.used = 0;
            }
            if self.used < self.max {
                self.used += 1;
                return;
            }
            tokio::time::sleep_until(self.window_start + self.window).await;
        }
    }
}
