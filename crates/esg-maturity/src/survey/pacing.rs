use std::time::Duration;

use rand::Rng;

pub const DEFAULT_PACING_MIN_MS: u64 = 800;
pub const DEFAULT_PACING_JITTER_MS: u64 = 600;

/// Cosmetic delay before the next question is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    base: Duration,
    jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(DEFAULT_PACING_MIN_MS, DEFAULT_PACING_JITTER_MS)
    }
}

impl Pacing {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_millis(base_ms: u64, jitter_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(base_ms),
            Duration::from_millis(jitter_ms),
        )
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.base.is_zero() && self.jitter.is_zero()
    }

    /// Base delay plus uniform jitter in `[0, jitter)`.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..jitter_ms);
        self.base + Duration::from_millis(extra)
    }

    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        tokio::time::sleep(self.next_delay()).await;
    }
}
