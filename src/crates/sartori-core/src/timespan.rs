use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing cycle positions for equality
pub const EPSILON: f64 = 1e-9;

/// A half-open span of cycles `[begin, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: f64,
    pub end: f64,
}

impl TimeSpan {
    /// Create a new timespan
    pub fn new(begin: f64, end: f64) -> Self {
        TimeSpan { begin, end }
    }

    /// Get the duration of this timespan
    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }

    /// Check if this timespan contains a point in time
    pub fn contains(&self, time: f64) -> bool {
        time >= self.begin && time < self.end
    }

    /// Check if two timespans overlap
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Midpoint of the span
    pub fn midpoint(&self) -> f64 {
        (self.begin + self.end) / 2.0
    }

    /// The integer cycle indices touched by this span, `floor(begin)..ceil(end)`
    pub fn cycles(&self) -> std::ops::Range<i64> {
        (self.begin.floor() as i64)..(self.end.ceil() as i64)
    }

    /// The time `fraction` of the way through this span
    pub fn lerp(&self, fraction: f64) -> f64 {
        self.begin + fraction * self.duration()
    }

    /// Scale both bounds by a factor
    pub fn scale(&self, factor: f64) -> TimeSpan {
        TimeSpan::new(self.begin * factor, self.end * factor)
    }

    /// Shift both bounds by an offset
    pub fn shift(&self, offset: f64) -> TimeSpan {
        TimeSpan::new(self.begin + offset, self.end + offset)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} → {})", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_is_half_open() {
        let a = TimeSpan::new(0.0, 1.0);
        assert!(a.overlaps(&TimeSpan::new(0.5, 1.5)));
        assert!(!a.overlaps(&TimeSpan::new(1.0, 2.0)));
        assert!(!a.overlaps(&TimeSpan::new(-1.0, 0.0)));
    }

    #[test]
    fn test_cycles() {
        assert_eq!(TimeSpan::new(0.0, 1.0).cycles(), 0..1);
        assert_eq!(TimeSpan::new(0.5, 2.25).cycles(), 0..3);
        assert_eq!(TimeSpan::new(-0.5, 0.5).cycles(), -1..1);
    }

    #[test]
    fn test_scale_and_lerp() {
        let span = TimeSpan::new(1.0, 2.0).scale(2.0);
        assert_eq!(span, TimeSpan::new(2.0, 4.0));
        assert_eq!(span.lerp(0.25), 2.5);
        assert_eq!(span.midpoint(), 3.0);
    }
}
