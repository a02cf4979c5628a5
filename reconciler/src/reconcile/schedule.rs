use std::time::Duration;

use rand::Rng;
use time::OffsetDateTime;

/// Minutes from `minute` past the hour to the next `:00` or `:30`.
pub fn minutes_until_next_slot(minute: u8) -> u8 {
    if minute < 30 {
        30 - minute
    } else {
        60 - minute
    }
}

/// Sleep before the next cycle. Seconds within the current minute are
/// ignored, and no jitter is applied so the cadence stays on the boundaries.
pub fn wait_until_next_slot(now: OffsetDateTime) -> Duration {
    Duration::from_secs(u64::from(minutes_until_next_slot(now.minute())) * 60)
}

/// Scales `base` by a uniform factor in `[1 - jitter, 1 + jitter]`.
pub fn jittered(base: Duration, jitter: f64) -> Duration {
    let jitter = jitter.clamp(0.0, 1.0);
    if jitter == 0.0 || base.is_zero() {
        return base;
    }
    let factor = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
    base.mul_f64(factor)
}
