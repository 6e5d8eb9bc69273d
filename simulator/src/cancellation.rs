use std::time::Duration;

use rand::Rng;

use crate::config::SimulationConfig;

/// One draw of the "driver cancelled" timer for a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPlan {
    /// Wall-clock delay after trip start before the timer elapses.
    pub delay: Duration,
    /// Whether elapsing cancels the trip or is a no-op.
    pub fires: bool,
}

impl CancellationPlan {
    /// Delay uniform in `[cancel_delay_min_ms, cancel_delay_max_ms]`, firing
    /// with `cancel_probability`.
    pub fn draw<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Self {
        let min = config.cancel_delay_min_ms;
        let max = config.cancel_delay_max_ms.max(min);
        let delay_ms = rng.gen_range(min..=max);
        let fires = rng.gen_bool(config.cancel_probability.clamp(0.0, 1.0));
        Self {
            delay: Duration::from_millis(delay_ms),
            fires,
        }
    }

    /// A timer that elapses at `delay` and always cancels.
    pub fn forced(delay: Duration) -> Self {
        Self { delay, fires: true }
    }

    pub fn never() -> Self {
        Self {
            delay: Duration::MAX,
            fires: false,
        }
    }
}
