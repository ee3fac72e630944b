//! Per-server token bucket (§4.9, §5: "tokens refill at
//! `max_requests_per_second`").

use std::time::{Duration, Instant};

/// A token bucket limiting request rate to a single GIS server.
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A bucket refilling at `requests_per_second`, starting full.
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            capacity: requests_per_second,
            tokens: requests_per_second,
            refill_per_sec: requests_per_second,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Try to take one token. Returns `true` if the request may proceed.
    pub fn try_acquire(&mut self) -> bool {
        self.refill(Instant::now());
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Sleep until a token is available, then take it (§4.9 default 10 req/s).
    pub async fn acquire(&mut self) {
        loop {
            self.refill(Instant::now());
            if self.tokens >= 1.0 {
                self.tokens -= 1.0;
                return;
            }
            let deficit = 1.0 - self.tokens;
            let wait = Duration::from_secs_f64(deficit / self.refill_per_sec);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Default rate per §4.9.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;
