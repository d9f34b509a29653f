//! Motion module for stepper-ramp.
//!
//! Provides profile planning, ramp math and the per-tick step scheduler.

mod profile;
mod ramp;
mod scheduler;
mod timing;

pub use profile::{Direction, MotionProfile};
pub use ramp::{RampPolicy, RampRate};
pub use scheduler::RampScheduler;
pub use timing::{Interval, RunCorrection, StepTimer, ONE_SECOND};
