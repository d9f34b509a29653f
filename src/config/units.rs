//! Unit types for drive resolution.
//!
//! Positions are counted in *position units*: 1/`resolution` of a full motor
//! step. The active drive mode decides how many units a single pulse covers.

use serde::Deserialize;

use crate::error::ConfigError;

/// Microstep divisor (1, 2, 4, 8, 16, 32, 64, 128, 256).
///
/// Validated at construction to be a power of 2 within the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Microsteps(u16);

impl Microsteps {
    /// Full step (no microstepping).
    pub const FULL: Self = Self(1);
    /// Half step.
    pub const HALF: Self = Self(2);
    /// Quarter step.
    pub const QUARTER: Self = Self(4);
    /// Eighth step.
    pub const EIGHTH: Self = Self(8);
    /// Sixteenth step.
    pub const SIXTEENTH: Self = Self(16);
    /// Thirty-second step.
    pub const THIRTY_SECOND: Self = Self(32);
    /// Sixty-fourth step.
    pub const SIXTY_FOURTH: Self = Self(64);
    /// 128th step.
    pub const ONE_TWENTY_EIGHTH: Self = Self(128);
    /// 256th step (maximum resolution).
    pub const TWO_FIFTY_SIXTH: Self = Self(256);

    /// Valid microstep values.
    const VALID_VALUES: [u16; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];

    /// Create a new Microsteps value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrosteps` if the value is not a valid power of 2.
    pub fn new(value: u16) -> Result<Self, ConfigError> {
        if Self::VALID_VALUES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidMicrosteps(value))
        }
    }

    /// Get the raw divisor value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Check if a value is valid.
    #[inline]
    pub fn is_valid(value: u16) -> bool {
        Self::VALID_VALUES.contains(&value)
    }

    /// Position units covered by one pulse in this mode, at `resolution`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MicrostepsExceedResolution` when this mode is
    /// finer than the resolution, since one pulse would be a fraction of a unit.
    pub fn step_size(self, resolution: Microsteps) -> Result<u16, ConfigError> {
        if self.0 > resolution.0 {
            return Err(ConfigError::MicrostepsExceedResolution {
                microsteps: self.0,
                resolution: resolution.0,
            });
        }
        // Both are powers of two, so the division is exact.
        Ok(resolution.0 / self.0)
    }
}

impl Default for Microsteps {
    fn default() -> Self {
        Self::SIXTEENTH
    }
}

impl TryFrom<u16> for Microsteps {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Microsteps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        Microsteps::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microsteps_valid_values() {
        for &v in &Microsteps::VALID_VALUES {
            assert!(Microsteps::new(v).is_ok());
        }
    }

    #[test]
    fn test_microsteps_invalid_values() {
        assert!(Microsteps::new(0).is_err());
        assert!(Microsteps::new(3).is_err());
        assert!(Microsteps::new(17).is_err());
        assert!(Microsteps::new(512).is_err());
    }

    #[test]
    fn test_step_size() {
        let res = Microsteps::SIXTEENTH;
        assert_eq!(Microsteps::SIXTEENTH.step_size(res), Ok(1));
        assert_eq!(Microsteps::HALF.step_size(res), Ok(8));
        assert_eq!(Microsteps::FULL.step_size(res), Ok(16));
    }

    #[test]
    fn test_step_size_finer_than_resolution() {
        let err = Microsteps::THIRTY_SECOND.step_size(Microsteps::SIXTEENTH);
        assert_eq!(
            err,
            Err(ConfigError::MicrostepsExceedResolution { microsteps: 32, resolution: 16 })
        );
    }
}
