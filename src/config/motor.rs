//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::limits::TravelLimits;
use super::units::Microsteps;

/// Complete motor configuration from TOML.
///
/// Speeds are in position units, so they keep their physical meaning when the
/// drive mode changes.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Finest microstep divisor; one position unit is 1/resolution of a full step.
    #[serde(default)]
    pub resolution: Microsteps,

    /// Initial drive mode (must not exceed `resolution`).
    #[serde(default)]
    pub microsteps: Microsteps,

    /// Maximum speed in position units per second.
    #[serde(rename = "max_speed_per_sec")]
    pub max_speed: u32,

    /// Acceleration in position units per second squared (0 disables ramping).
    #[serde(default, rename = "acceleration_per_sec2")]
    pub acceleration: u32,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Enable pin is active low (typical for A4988/DRV8825 style drivers).
    #[serde(default = "default_enable_active_low")]
    pub enable_active_low: bool,

    /// Minimum STEP high time in microseconds.
    #[serde(default = "default_pulse_width_us")]
    pub pulse_width_us: u32,

    /// Optional software travel limits.
    #[serde(default)]
    pub limits: Option<TravelLimits>,
}

fn default_enable_active_low() -> bool {
    true
}

fn default_pulse_width_us() -> u32 {
    2
}

impl MotorConfig {
    /// Minimal configuration with defaults for everything but name and speed.
    pub fn new(name: &str, max_speed: u32) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            resolution: Microsteps::default(),
            microsteps: Microsteps::default(),
            max_speed,
            acceleration: 0,
            invert_direction: false,
            enable_active_low: default_enable_active_low(),
            pulse_width_us: default_pulse_width_us(),
            limits: None,
        }
    }

    /// Position units per full motor step.
    pub fn units_per_full_step(&self) -> u16 {
        self.resolution.value()
    }

    /// Travel limits, unbounded when none are configured.
    pub fn travel_limits(&self) -> TravelLimits {
        self.limits.unwrap_or_default()
    }
}
