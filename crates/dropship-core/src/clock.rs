//! Phase clock: elapsed time since the current phase began.
//!
//! The clock is advanced once per tick by the frame delta and reset to zero
//! on every phase transition. Within a phase it never decreases: negative
//! and non-finite deltas are rejected before they touch the counter.

/// Errors that can occur when advancing a clock.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// The frame delta was negative, NaN or infinite.
    #[error("invalid frame delta: {dt}")]
    InvalidDelta {
        /// The rejected delta, in seconds.
        dt: f64,
    },
}

/// Validate a frame delta in seconds.
///
/// # Errors
///
/// Returns [`ClockError::InvalidDelta`] if `dt` is negative or not finite.
pub fn validate_delta(dt: f64) -> Result<f64, ClockError> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(dt)
    } else {
        Err(ClockError::InvalidDelta { dt })
    }
}

/// Elapsed time within the current phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseClock {
    /// Seconds since the current phase began.
    elapsed: f64,

    /// Ticks since the current phase began.
    ticks: u64,
}

impl PhaseClock {
    /// Create a clock at zero.
    pub const fn new() -> Self {
        Self {
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Advance by `dt` seconds. Returns the new elapsed time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDelta`] if `dt` is negative or not
    /// finite; the clock is left unchanged.
    pub fn advance(&mut self, dt: f64) -> Result<f64, ClockError> {
        let dt = validate_delta(dt)?;
        self.elapsed += dt;
        self.ticks = self.ticks.saturating_add(1);
        Ok(self.elapsed)
    }

    /// Seconds since the current phase began.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Ticks since the current phase began.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Reset to zero (called on every phase transition).
    pub const fn reset(&mut self) {
        self.elapsed = 0.0;
        self.ticks = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn clock_starts_at_zero() {
        let clock = PhaseClock::new();
        assert!(clock.elapsed().abs() < EPSILON);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn clock_accumulates_deltas() {
        let mut clock = PhaseClock::new();
        clock.advance(0.5).unwrap();
        clock.advance(0.25).unwrap();
        assert!((clock.elapsed() - 0.75).abs() < EPSILON);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn zero_delta_is_allowed() {
        let mut clock = PhaseClock::new();
        assert!(clock.advance(0.0).is_ok());
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn negative_delta_is_rejected_without_change() {
        let mut clock = PhaseClock::new();
        clock.advance(1.0).unwrap();
        assert!(clock.advance(-0.1).is_err());
        assert!(clock.advance(f64::NAN).is_err());
        assert!(clock.advance(f64::INFINITY).is_err());
        assert!((clock.elapsed() - 1.0).abs() < EPSILON);
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut clock = PhaseClock::new();
        clock.advance(3.0).unwrap();
        clock.reset();
        assert!(clock.elapsed().abs() < EPSILON);
        assert_eq!(clock.ticks(), 0);
    }
}
