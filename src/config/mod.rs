//! Configuration module for stepper-ramp.
//!
//! Provides types for loading and validating motor configurations
//! from TOML files (with `std` feature) or pre-parsed data.

mod limits;
mod motor;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use limits::TravelLimits;
pub use motor::MotorConfig;
pub use system::SystemConfig;
pub use validation::{validate_config, validate_motor};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::Microsteps;
