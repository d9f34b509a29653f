//! Position tracking for stepper motors.
//!
//! Absolute position is kept in position units (1/resolution of a full step)
//! so it stays valid when the drive mode changes. The tracker is only written
//! when a move finishes; an in-flight position is derived from the pulses
//! emitted so far.

use crate::config::{Microsteps, TravelLimits};
use crate::error::{ConfigError, Error, MotorError, Result};
use crate::motion::Direction;

/// Absolute position, travel limits and drive-mode scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTracker {
    position: i64,
    limits: TravelLimits,
    resolution: Microsteps,
    drive_mode: Microsteps,
    step_size: u16,
}

impl PositionTracker {
    /// Create a tracker at position 0 (clamped into `limits`).
    ///
    /// # Errors
    ///
    /// - `ConfigError::MicrostepsExceedResolution` if `drive_mode` is finer than `resolution`
    /// - `ConfigError::InvalidLimits` if `limits` are inverted
    pub fn new(
        resolution: Microsteps,
        drive_mode: Microsteps,
        limits: TravelLimits,
    ) -> core::result::Result<Self, ConfigError> {
        let step_size = drive_mode.step_size(resolution)?;
        if !limits.is_valid() {
            return Err(ConfigError::InvalidLimits {
                forward: limits.forward,
                reverse: limits.reverse,
            });
        }

        Ok(Self {
            position: limits.clamp(0),
            limits,
            resolution,
            drive_mode,
            step_size,
        })
    }

    /// Committed position in units.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Travel limits.
    #[inline]
    pub fn limits(&self) -> TravelLimits {
        self.limits
    }

    /// Finest microstep divisor.
    #[inline]
    pub fn resolution(&self) -> Microsteps {
        self.resolution
    }

    /// Active drive mode.
    #[inline]
    pub fn drive_mode(&self) -> Microsteps {
        self.drive_mode
    }

    /// Units covered by one pulse.
    #[inline]
    pub fn step_size(&self) -> u16 {
        self.step_size
    }

    /// Clamp a target into the travel limits.
    #[inline]
    pub fn clamp(&self, target: i64) -> i64 {
        self.limits.clamp(target)
    }

    /// Overwrite the position, clamped into the limits. Returns the stored value.
    pub fn set_position(&mut self, position: i64) -> i64 {
        self.position = self.limits.clamp(position);
        self.position
    }

    /// Replace the travel limits.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidLimits` if `forward < reverse`
    /// - `MotorError::LimitExceeded` if the current position falls outside
    pub fn set_limits(&mut self, limits: TravelLimits) -> Result<()> {
        if !limits.is_valid() {
            return Err(Error::Config(ConfigError::InvalidLimits {
                forward: limits.forward,
                reverse: limits.reverse,
            }));
        }
        if !limits.contains(self.position) {
            let limit = if self.position > limits.forward {
                limits.forward
            } else {
                limits.reverse
            };
            return Err(Error::Motor(MotorError::LimitExceeded {
                position: self.position,
                limit,
            }));
        }

        self.limits = limits;
        Ok(())
    }

    /// Switch drive mode. Position in units is unchanged.
    ///
    /// # Errors
    ///
    /// `ConfigError::MicrostepsExceedResolution` if `mode` is finer than the resolution.
    pub fn set_drive_mode(&mut self, mode: Microsteps) -> core::result::Result<(), ConfigError> {
        self.step_size = mode.step_size(self.resolution)?;
        self.drive_mode = mode;
        Ok(())
    }

    /// Whole pulses from the current position toward `target`, and the direction.
    ///
    /// Partial pulses off the drive-mode grid are dropped, so the move never
    /// passes the target.
    pub fn pulses_to(&self, target: i64) -> (u64, Direction) {
        let distance = self.position.abs_diff(target) / self.step_size as u64;
        let direction = if target >= self.position {
            Direction::Forward
        } else {
            Direction::Backward
        };
        (distance, direction)
    }

    /// Position reached after `pulses` in `direction` from the committed position.
    #[inline]
    pub fn offset(&self, direction: Direction, pulses: u32) -> i64 {
        let units = pulses as i64 * self.step_size as i64;
        self.position.saturating_add(direction.sign() * units)
    }

    /// Fold a finished move into the committed position.
    pub fn commit(&mut self, direction: Direction, pulses: u32) {
        self.position = self.offset(direction, pulses);
    }

    /// Convert a rate in units into whole pulses of the active drive mode.
    #[inline]
    pub fn to_pulses(&self, units: u32) -> u32 {
        units / self.step_size as u32
    }
}
