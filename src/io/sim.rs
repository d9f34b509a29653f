//! Simulated clock, pulse output and pin for running moves off-target.
//!
//! Nothing here touches hardware. Tests and host-side tools drive a motor by
//! advancing a [`SimClock`] and reading back what the doubles recorded.

use core::cell::Cell;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use super::{MicrosClock, PulseEmitter};

/// Failure injected into a simulated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimError;

impl digital::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Settable microsecond clock.
///
/// Interior mutability lets a test advance time while a motor reads it
/// through [`SimClock::source`].
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<u32>,
}

impl SimClock {
    /// Clock starting at `start` µs.
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Current time.
    #[inline]
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    /// Jump to `t`.
    pub fn set(&self, t: u32) {
        self.now.set(t);
    }

    /// Move forward by `us`, wrapping like a hardware counter.
    pub fn advance(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
    }

    /// Borrowing clock handle to hand to a motor.
    pub fn source(&self) -> impl Fn() -> u32 + '_ {
        move || self.now()
    }
}

impl MicrosClock for SimClock {
    fn now_micros(&self) -> u32 {
        self.now()
    }
}

/// Counts pulses and can fail on demand.
#[derive(Debug, Default, Clone)]
pub struct RecordingEmitter {
    pulses: u32,
    fail_at: Option<u32>,
}

impl RecordingEmitter {
    /// Emitter that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitter whose pulse number `n` (zero based) and every later one fails.
    pub fn failing_at(n: u32) -> Self {
        Self {
            pulses: 0,
            fail_at: Some(n),
        }
    }

    /// Pulses successfully emitted.
    #[inline]
    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    /// Stop injecting failures.
    pub fn clear_failure(&mut self) {
        self.fail_at = None;
    }

    /// Zero the pulse counter.
    pub fn reset(&mut self) {
        self.pulses = 0;
    }
}

impl PulseEmitter for RecordingEmitter {
    type Error = SimError;

    fn emit(&mut self) -> Result<(), Self::Error> {
        if matches!(self.fail_at, Some(n) if self.pulses >= n) {
            return Err(SimError);
        }
        self.pulses += 1;
        Ok(())
    }
}

/// Output pin that remembers its level.
#[derive(Debug, Default, Clone)]
pub struct SimPin {
    high: bool,
    writes: u32,
    fail: bool,
}

impl SimPin {
    /// Pin starting low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Current level.
    #[inline]
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of successful writes.
    #[inline]
    pub fn writes(&self) -> u32 {
        self.writes
    }

    fn write(&mut self, high: bool) -> Result<(), SimError> {
        if self.fail {
            return Err(SimError);
        }
        self.high = high;
        self.writes += 1;
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
