//! Motor module for stepper-ramp.
//!
//! Provides the stepper motor facade, its builder and position tracking.

mod builder;
mod driver;
mod position;
mod state;

pub use builder::StepperMotorBuilder;
pub use driver::StepperMotor;
pub use position::PositionTracker;
pub use state::MoveState;
