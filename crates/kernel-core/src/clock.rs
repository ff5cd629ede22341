//! Authoritative simulated time.

use contracts::{TimeUnit, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Seconds since midnight of the first simulated day.
///
/// Time only ever moves forward: `advance_by` ignores negative and non-finite amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    current: f64,
    step: f64,
}

impl Clock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            current: if start.is_finite() { start.max(0.0) } else { 0.0 },
            step: if step.is_finite() { step.max(0.0) } else { 0.0 },
        }
    }

    /// Advance by the default step and return the new time.
    pub fn advance(&mut self) -> f64 {
        self.advance_by(self.step)
    }

    /// Advance by `amount` seconds and return the new time.
    pub fn advance_by(&mut self, amount: f64) -> f64 {
        if amount.is_finite() && amount > 0.0 {
            self.current += amount;
        }
        self.current
    }

    pub fn now(&self) -> f64 {
        self.current
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Current time expressed in `unit`.
    pub fn time_in(&self, unit: TimeUnit) -> f64 {
        seconds_to_unit(self.current, unit)
    }

    pub fn display(&self) -> String {
        clock_display(self.current)
    }
}

pub fn seconds_to_unit(seconds: f64, unit: TimeUnit) -> f64 {
    seconds / unit.seconds()
}

pub fn unit_to_seconds(value: f64, unit: TimeUnit) -> f64 {
    value * unit.seconds()
}

/// Render seconds since midnight as `h:mm:ss AM|PM`, wrapping at midnight.
pub fn clock_display(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64 % SECONDS_PER_DAY as u64;
    let hours = total / SECONDS_PER_HOUR as u64;
    let minutes = (total % SECONDS_PER_HOUR as u64) / SECONDS_PER_MINUTE as u64;
    let secs = total % SECONDS_PER_MINUTE as u64;
    let meridiem = if hours < 12 { "AM" } else { "PM" };
    let display_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{display_hour}:{minutes:02}:{secs:02} {meridiem}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_uses_default_step() {
        let mut clock = Clock::new(100.0, 0.5);
        assert_eq!(clock.advance(), 100.5);
        assert_eq!(clock.advance_by(10.0), 110.5);
        assert_eq!(clock.now(), 110.5);
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut clock = Clock::new(50.0, 1.0);
        clock.advance_by(-20.0);
        clock.advance_by(f64::NAN);
        assert_eq!(clock.now(), 50.0);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(seconds_to_unit(7200.0, TimeUnit::Hour), 2.0);
        assert_eq!(seconds_to_unit(90.0, TimeUnit::Minute), 1.5);
        assert_eq!(unit_to_seconds(3.0, TimeUnit::Minute), 180.0);
        let clock = Clock::new(5400.0, 1.0);
        assert_eq!(clock.time_in(TimeUnit::Hour), 1.5);
    }

    #[test]
    fn display_formats_twelve_hour_clock() {
        assert_eq!(clock_display(33_600.0), "9:20:00 AM");
        assert_eq!(clock_display(0.0), "12:00:00 AM");
        assert_eq!(clock_display(43_200.0), "12:00:00 PM");
        assert_eq!(clock_display(46_805.9), "1:00:05 PM");
        assert_eq!(clock_display(SECONDS_PER_DAY + 61.0), "12:01:01 AM");
    }
}
