//! Software travel limits.

use serde::Deserialize;

/// Forward/reverse travel limits in position units.
///
/// Targets outside the limits are clamped to the nearest limit, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TravelLimits {
    /// Highest reachable position.
    #[serde(default = "default_forward")]
    pub forward: i64,

    /// Lowest reachable position.
    #[serde(default = "default_reverse")]
    pub reverse: i64,
}

fn default_forward() -> i64 {
    i64::MAX
}

fn default_reverse() -> i64 {
    i64::MIN
}

impl Default for TravelLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl TravelLimits {
    /// Create new limits.
    pub const fn new(reverse: i64, forward: i64) -> Self {
        Self { forward, reverse }
    }

    /// Limits spanning the whole position range.
    pub const fn unbounded() -> Self {
        Self {
            forward: i64::MAX,
            reverse: i64::MIN,
        }
    }

    /// Check if limits are valid (forward >= reverse).
    pub fn is_valid(&self) -> bool {
        self.forward >= self.reverse
    }

    /// Check if a position is within limits.
    pub fn contains(&self, position: i64) -> bool {
        position >= self.reverse && position <= self.forward
    }

    /// Clamp a target into the limits.
    pub fn clamp(&self, target: i64) -> i64 {
        if target > self.forward {
            self.forward
        } else if target < self.reverse {
            self.reverse
        } else {
            target
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        let limits = TravelLimits::new(-1000, 1000);

        assert_eq!(limits.clamp(0), 0);
        assert_eq!(limits.clamp(1000), 1000);
        assert_eq!(limits.clamp(5000), 1000);
        assert_eq!(limits.clamp(-5000), -1000);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let limits = TravelLimits::new(-10, 10);

        assert!(limits.contains(-10));
        assert!(limits.contains(10));
        assert!(!limits.contains(11));
        assert!(!limits.contains(-11));
    }

    #[test]
    fn test_validity() {
        assert!(TravelLimits::new(5, 5).is_valid());
        assert!(!TravelLimits::new(6, 5).is_valid());
        assert!(TravelLimits::default().is_valid());
    }
}
