//! Motion profile planning.
//!
//! Splits a move into acceleration, run and deceleration distances. Distances
//! are cumulative pulse counts: the accel phase ends at `dist_accel`, the run
//! phase at `dist_run`, the move at `dist_total`.

use libm::{ceil, sqrt};

use crate::error::MotionError;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward increasing position.
    #[default]
    Forward,
    /// Toward decreasing position.
    Backward,
}

impl Direction {
    /// Get direction from a signed distance.
    #[inline]
    pub fn from_delta(delta: i64) -> Self {
        if delta >= 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Frozen plan for one move, in pulses of the active drive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionProfile {
    /// Total pulses in the move.
    pub dist_total: u32,

    /// Pulse count at which acceleration ends.
    pub dist_accel: u32,

    /// Pulse count at which the run phase ends.
    pub dist_run: u32,

    /// Direction of motion.
    pub direction: Direction,

    /// Cruise speed in pulses/s.
    pub top_speed: u32,

    /// Speed right after the first pulse from rest, in pulses/s.
    pub start_speed: u32,
}

impl MotionProfile {
    /// Plan a move of `distance` pulses.
    ///
    /// With `accel == 0` the whole move runs at `max_speed`. Otherwise the
    /// profile is trapezoidal when `max_speed` can be reached and released
    /// again within the distance, triangular when it cannot.
    ///
    /// # Errors
    ///
    /// - `MotionError::AlreadyAtTarget` if `distance == 0`
    /// - `MotionError::ZeroSpeed` if `max_speed == 0`
    pub fn plan(
        distance: u32,
        direction: Direction,
        max_speed: u32,
        accel: u32,
    ) -> Result<Self, MotionError> {
        if distance == 0 {
            return Err(MotionError::AlreadyAtTarget);
        }
        if max_speed == 0 {
            return Err(MotionError::ZeroSpeed);
        }

        if accel == 0 {
            return Ok(Self {
                dist_total: distance,
                dist_accel: 0,
                dist_run: distance,
                direction,
                top_speed: max_speed,
                start_speed: max_speed,
            });
        }

        let max_accel_dist = Self::accel_distance(max_speed, accel);
        let half = distance / 2;

        let (dist_accel, dist_run, top_speed) = if max_accel_dist >= half as u64 {
            // Triangle: max_speed is out of reach
            let top = sqrt(2.0 * half as f64 * accel as f64) as u32;
            (half, half, top.clamp(1, max_speed))
        } else {
            let dist_accel = max_accel_dist as u32;
            (dist_accel, distance - dist_accel, max_speed)
        };

        // Rounded up so the first ramp step has a·t² <= 0.5
        let start_speed = (ceil(sqrt(2.0 * accel as f64)) as u32).clamp(1, top_speed);

        Ok(Self {
            dist_total: distance,
            dist_accel,
            dist_run,
            direction,
            top_speed,
            start_speed,
        })
    }

    /// Pulses needed to reach `speed` from rest: `speed² / 2a`.
    #[inline]
    pub fn accel_distance(speed: u32, accel: u32) -> u64 {
        if accel == 0 {
            return 0;
        }
        (speed as u64 * speed as u64) / (2 * accel as u64)
    }

    /// Pulses spent accelerating.
    #[inline]
    pub fn accel_steps(&self) -> u32 {
        self.dist_accel
    }

    /// Pulses spent at top speed.
    #[inline]
    pub fn run_steps(&self) -> u32 {
        self.dist_run - self.dist_accel
    }

    /// Pulses spent decelerating.
    #[inline]
    pub fn decel_steps(&self) -> u32 {
        self.dist_total - self.dist_run
    }

    /// Whether the top speed is below the requested maximum.
    #[inline]
    pub fn is_triangular(&self) -> bool {
        self.dist_accel == self.dist_run && self.dist_accel > 0
    }
}
