//! Hardware seams.
//!
//! The motor consumes exactly two outside services besides plain output pins:
//! a free-running microsecond clock and something that produces one step
//! pulse. Both are traits so host tests can drive full moves without hardware.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

pub mod sim;

/// Monotonic microsecond counter that wraps silently at `u32::MAX`.
pub trait MicrosClock {
    /// Current counter value.
    fn now_micros(&self) -> u32;
}

impl<F> MicrosClock for F
where
    F: Fn() -> u32,
{
    fn now_micros(&self) -> u32 {
        self()
    }
}

/// Produces one step pulse.
pub trait PulseEmitter {
    /// Error reported by the underlying output.
    type Error: core::fmt::Debug;

    /// Emit one pulse. Returns once the minimum high time has elapsed.
    fn emit(&mut self) -> Result<(), Self::Error>;
}

impl<T: PulseEmitter + ?Sized> PulseEmitter for &mut T {
    type Error = T::Error;

    fn emit(&mut self) -> Result<(), Self::Error> {
        T::emit(self)
    }
}

/// STEP pin pulsed high for a fixed width through a busy-wait delay.
pub struct StepPulse<STEP, DELAY>
where
    STEP: OutputPin,
    DELAY: DelayNs,
{
    step_pin: STEP,
    delay: DELAY,
    width_us: u32,
}

impl<STEP, DELAY> StepPulse<STEP, DELAY>
where
    STEP: OutputPin,
    DELAY: DelayNs,
{
    /// Pulse `step_pin` high for `width_us` microseconds per step.
    pub fn new(step_pin: STEP, delay: DELAY, width_us: u32) -> Self {
        Self {
            step_pin,
            delay,
            width_us,
        }
    }

    /// Configured high time.
    #[inline]
    pub fn width_us(&self) -> u32 {
        self.width_us
    }

    /// Give back the pin and delay.
    pub fn release(self) -> (STEP, DELAY) {
        (self.step_pin, self.delay)
    }
}

impl<STEP, DELAY> PulseEmitter for StepPulse<STEP, DELAY>
where
    STEP: OutputPin,
    DELAY: DelayNs,
{
    type Error = STEP::Error;

    fn emit(&mut self) -> Result<(), Self::Error> {
        self.step_pin.set_high()?;
        self.delay.delay_us(self.width_us);
        self.step_pin.set_low()
    }
}

/// Placeholder for an output line the driver board does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
