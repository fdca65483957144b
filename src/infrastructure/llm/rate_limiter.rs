//! Token bucket rate limiter for outbound API requests.
//!
//! Tokens refill continuously with elapsed time; capacity equals the
//! refill rate, so a full bucket allows a one-second burst.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

pub struct TokenBucketRateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketRateLimiter {
    /// Limiter allowing `requests_per_second` sustained requests. Rates
    /// at or below zero disable limiting.
    pub fn new(requests_per_second: f64) -> Self {
        let rate = if requests_per_second > 0.0 { requests_per_second } else { f64::INFINITY };
        Self {
            state: Mutex::new(BucketState { tokens: rate, last_refill: Instant::now() }),
            capacity: rate,
            refill_rate: rate,
        }
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                (1.0 - state.tokens) / self.refill_rate
            };
            sleep(Duration::from_secs_f64(wait)).await;
        }
    }
}
