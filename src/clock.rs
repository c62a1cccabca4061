//! Wall-clock holds.

use std::time::Duration;

/// Source of blocking pauses. Every hold in the crate goes through one of these.
pub trait Clock {
    /// Blocks for `duration`. A hold always runs to completion.
    fn hold(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hold(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn hold(&mut self, duration: Duration) {
        (**self).hold(duration)
    }
}

/// Converts a duration expressed in time units into wall-clock time.
///
/// Negative or non-finite unit counts collapse to zero; results past [`Duration::MAX`]
/// saturate.
pub fn units_to_duration(time_unit: Duration, units: f64) -> Duration {
    checked_units_to_duration(time_unit, units).unwrap_or(Duration::MAX)
}

/// Like [`units_to_duration`], but `None` when the result does not fit a [`Duration`].
pub fn checked_units_to_duration(time_unit: Duration, units: f64) -> Option<Duration> {
    if units.is_finite() && units > 0.0 {
        Duration::try_from_secs_f64(time_unit.as_secs_f64() * units).ok()
    } else {
        Some(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_units() {
        let unit = Duration::from_secs(1);
        assert_eq!(units_to_duration(unit, 0.5), Duration::from_millis(500));
        assert_eq!(units_to_duration(unit, 2.0), Duration::from_secs(2));
        assert_eq!(units_to_duration(unit, -1.0), Duration::ZERO);
        assert_eq!(units_to_duration(unit, f64::NAN), Duration::ZERO);
    }

    #[test]
    fn huge_holds_saturate() {
        let unit = Duration::from_secs(1);
        assert_eq!(checked_units_to_duration(unit, 1e30), None);
        assert_eq!(units_to_duration(unit, 1e30), Duration::MAX);
        assert_eq!(units_to_duration(Duration::MAX, 2.0), Duration::MAX);
    }
}
