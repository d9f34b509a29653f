//! # stepper-ramp
//!
//! Tick-driven ramped step generation for STEP/DIR stepper drivers, with
//! embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Non-blocking**: `tick()` emits at most one pulse and returns
//! - **Trapezoidal and triangular ramps**: multiply/shift interval updates, no sqrt per step
//! - **Wrap-safe timing**: a free-running `u32` microsecond clock may roll over mid-move
//! - **Drive-mode independent position**: absolute position survives microstep changes
//! - **Configuration-driven**: define motors in TOML files
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_ramp::{StepperMotorBuilder, SystemConfig};
//!
//! // Load configuration from TOML
//! let config: SystemConfig = stepper_ramp::load_config("motors.toml")?;
//!
//! // Create motor with embedded-hal pins and a microsecond counter
//! let mut motor = StepperMotorBuilder::new()
//!     .from_config(&config, "x_axis")?
//!     .step_pin(step_pin, delay)
//!     .dir_pin(dir_pin)
//!     .clock(|| timer.now_micros())
//!     .build()?;
//!
//! motor.prepare_move(3200)?;
//! while motor.tick()?.is_active() {
//!     // other work
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod io;
pub mod motion;
pub mod motor;

// Re-exports for ergonomic API
pub use config::{validate_config, MotorConfig, SystemConfig, TravelLimits};
pub use error::{Error, Result};
pub use io::{MicrosClock, NoPin, PulseEmitter, StepPulse};
pub use motion::{Direction, MotionProfile};
pub use motor::{MoveState, PositionTracker, StepperMotor, StepperMotorBuilder};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::Microsteps;
