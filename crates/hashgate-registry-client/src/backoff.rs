use rand::Rng;
use std::time::Duration;

/// Exponential backoff with uniform jitter in [0.75, 1.25], so retrying
/// clients never synchronize into a storm.
#[derive(Clone, Debug)]
pub struct Backoff {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Backoff {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before retry `attempt` (0-based), without jitter.
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64 << attempt.min(16);
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms(attempt);
        let permille = rand::thread_rng().gen_range(750..=1250u64);
        Duration::from_millis(base.saturating_mul(permille) / 1000)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(1000, 30_000)
    }
}
