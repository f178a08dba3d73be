use crate::error::AppError;
use dashmap::DashMap;
use std::time::Instant;

#[derive(Clone)]
struct Bucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64,
    last_update: Instant,
}

impl Bucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn allow_request(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = f64::min(
            self.capacity as f64,
            self.tokens + elapsed * self.refill_rate,
        );
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-key token buckets, keyed as `participant_id:action`
#[derive(Default)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_rate_limit(
        &self,
        key: &str,
        capacity: u32,
        refill_rate: f64,
    ) -> Result<(), AppError> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(capacity, refill_rate));

        if bucket.allow_request() {
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded(format!("Rate limit for {}", key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_exhausts_then_rejects() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            limiter.check_rate_limit("p1:enqueue", 3, 0.0).unwrap();
        }
        assert!(matches!(
            limiter.check_rate_limit("p1:enqueue", 3, 0.0),
            Err(AppError::RateLimitExceeded(_))
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        limiter.check_rate_limit("p1:enqueue", 1, 0.0).unwrap();
        assert!(limiter.check_rate_limit("p1:enqueue", 1, 0.0).is_err());
        limiter.check_rate_limit("p2:enqueue", 1, 0.0).unwrap();
        limiter.check_rate_limit("p1:cancel", 1, 0.0).unwrap();
    }
}
