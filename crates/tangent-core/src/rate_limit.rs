use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fixed-window limits. Defaults match the public deployment: 10 requests
/// per identifier per 60-second window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    /// Rejected; retry after this many whole seconds.
    Rejected { retry_after_secs: u64 },
}

/// Process-local fixed-window rate limiter.
///
/// Explicitly owned state, no module-level singleton: the server constructs
/// one instance, hands it to the middleware, and drives the periodic sweep
/// itself. The sharded map keeps each identifier's read-modify-write atomic
/// under parallel request handling, and a sweep deleting an entry mid-check
/// is benign: the next check simply starts a fresh window.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn check(&self, client_id: &str) -> Decision {
        self.check_at(client_id, Instant::now())
    }

    /// Admission check at an explicit instant (injected for tests).
    pub fn check_at(&self, client_id: &str, now: Instant) -> Decision {
        let mut entry = self
            .entries
            .entry(client_id.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now + self.config.window,
            });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + self.config.window;
        }

        entry.count += 1;
        if entry.count > self.config.max_requests {
            let remaining = entry.reset_at.saturating_duration_since(now);
            let retry_after_secs = ((remaining.as_millis() + 999) / 1000) as u64;
            return Decision::Rejected { retry_after_secs };
        }

        Decision::Admitted
    }

    /// Delete expired windows. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        before - self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Derive the rate-limit identity from a forwarded-IP header value: first
/// comma-separated hop, trimmed; `"unknown"` when absent or blank.
pub fn client_id(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[test]
    fn admits_up_to_the_limit_then_rejects() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..10 {
            assert_eq!(limiter.check_at("1.2.3.4", now), Decision::Admitted);
        }
        match limiter.check_at("1.2.3.4", now) {
            Decision::Rejected { retry_after_secs } => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            Decision::Admitted => panic!("11th request should be rejected"),
        }
    }

    #[test]
    fn identifiers_are_tracked_independently() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..10 {
            assert_eq!(limiter.check_at("1.2.3.4", now), Decision::Admitted);
        }
        assert_eq!(limiter.check_at("5.6.7.8", now), Decision::Admitted);
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..11 {
            limiter.check_at("1.2.3.4", start);
        }
        let later = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at("1.2.3.4", later), Decision::Admitted);
        // Fresh window: nine more fit before the next rejection
        for _ in 0..9 {
            assert_eq!(limiter.check_at("1.2.3.4", later), Decision::Admitted);
        }
        assert!(matches!(
            limiter.check_at("1.2.3.4", later),
            Decision::Rejected { .. }
        ));
    }

    #[test]
    fn retry_after_rounds_up_partial_seconds() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(1500),
        });
        let now = Instant::now();
        assert_eq!(limiter.check_at("c", now), Decision::Admitted);
        assert_eq!(
            limiter.check_at("c", now),
            Decision::Rejected {
                retry_after_secs: 2
            }
        );
    }

    #[test]
    fn rejected_requests_keep_counting_within_the_window() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });
        let now = Instant::now();
        limiter.check_at("c", now);
        limiter.check_at("c", now);
        for _ in 0..5 {
            assert!(matches!(
                limiter.check_at("c", now),
                Decision::Rejected { .. }
            ));
        }
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("fresh", start + Duration::from_secs(30));

        let removed = limiter.sweep_at(start + Duration::from_secs(61));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn sweep_race_falls_back_to_fresh_window() {
        let limiter = limiter();
        let start = Instant::now();
        for _ in 0..11 {
            limiter.check_at("c", start);
        }
        // Sweep drops the expired entry; the next check is a new window
        let later = start + Duration::from_secs(120);
        limiter.sweep_at(later);
        assert!(limiter.is_empty());
        assert_eq!(limiter.check_at("c", later), Decision::Admitted);
    }

    #[test]
    fn client_id_takes_first_forwarded_hop() {
        assert_eq!(client_id(Some("1.2.3.4, 10.0.0.1")), "1.2.3.4");
        assert_eq!(client_id(Some("  9.9.9.9  ")), "9.9.9.9");
        assert_eq!(client_id(Some("")), "unknown");
        assert_eq!(client_id(None), "unknown");
    }
}
