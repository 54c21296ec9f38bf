use std::time::Duration;

/// Bounds the pose publication rate on simulation time
#[derive(Clone, Debug)]
pub struct PoseRateLimiter {
    min_interval: Duration,
    last_publish: Duration,
}

impl PoseRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_publish: Duration::ZERO,
        }
    }

    /// A publication is due when strictly more than the minimum interval elapsed
    /// and somebody listens.
    pub fn is_due(&self, now: Duration, subscribers: usize) -> bool {
        subscribers > 0 && now.saturating_sub(self.last_publish) > self.min_interval
    }

    pub fn mark_published(&mut self, now: Duration) {
        self.last_publish = now;
    }
}
