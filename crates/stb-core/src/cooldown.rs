use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

// ============== Per-user command cooldown (token bucket) ==============

#[derive(Clone, Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Token bucket per user.
///
/// `RateLimiter::new(true, 1, 5s)` allows one invocation per five second window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    enabled: bool,
    max_tokens: f64,
    refill_per_sec: f64,
    buckets: HashMap<UserId, Bucket>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Admission {
    Allowed,
    Throttled { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(enabled: bool, max_tokens: u32, window: Duration) -> Self {
        let max_tokens_f = f64::from(max_tokens.max(1));
        let window_secs = window.as_secs_f64().max(1e-9);

        Self {
            enabled,
            max_tokens: max_tokens_f,
            refill_per_sec: max_tokens_f / window_secs,
            buckets: HashMap::new(),
        }
    }

    /// One invocation per `window` per user.
    pub fn per_user_cooldown(window: Duration) -> Self {
        Self::new(!window.is_zero(), 1, window)
    }

    pub fn check(&mut self, user_id: UserId) -> Admission {
        self.check_at(user_id, Instant::now())
    }

    pub fn check_at(&mut self, user_id: UserId, now: Instant) -> Admission {
        if !self.enabled {
            return Admission::Allowed;
        }

        let bucket = self.buckets.entry(user_id).or_insert_with(|| Bucket {
            tokens: self.max_tokens,
            last_update: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Admission::Allowed;
        }

        let secs = (1.0 - bucket.tokens) / self.refill_per_sec;
        Admission::Throttled {
            retry_after: Duration::from_secs_f64(secs.max(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_invocation_per_window_per_user() {
        let start = Instant::now();
        let mut rl = RateLimiter::per_user_cooldown(Duration::from_secs(5));
        let u = UserId(1);

        assert_eq!(rl.check_at(u, start), Admission::Allowed);
        match rl.check_at(u, start + Duration::from_secs(2)) {
            Admission::Throttled { retry_after } => {
                assert!(retry_after <= Duration::from_secs(3));
                assert!(retry_after > Duration::from_millis(2900));
            }
            Admission::Allowed => panic!("second call inside the window must be throttled"),
        }
        assert_eq!(
            rl.check_at(u, start + Duration::from_secs(5)),
            Admission::Allowed
        );
    }

    #[test]
    fn users_are_limited_independently() {
        let start = Instant::now();
        let mut rl = RateLimiter::per_user_cooldown(Duration::from_secs(5));

        assert_eq!(rl.check_at(UserId(1), start), Admission::Allowed);
        assert_eq!(rl.check_at(UserId(2), start), Admission::Allowed);
        assert!(matches!(
            rl.check_at(UserId(1), start),
            Admission::Throttled { .. }
        ));
    }

    #[test]
    fn zero_window_disables_the_limit() {
        let start = Instant::now();
        let mut rl = RateLimiter::per_user_cooldown(Duration::ZERO);
        for _ in 0..10 {
            assert_eq!(rl.check_at(UserId(1), start), Admission::Allowed);
        }
    }
}
