//! Step timing primitives.
//!
//! All clock arithmetic is done on a wrapping `u32` microsecond counter, so a
//! step that straddles the counter rollover fires exactly when it is due.

/// Microseconds per second.
pub const ONE_SECOND: u32 = 1_000_000;

/// Fractional bits kept in an [`Interval`].
pub(crate) const FRAC_BITS: u32 = 16;

const FRAC_MASK: u64 = (1 << FRAC_BITS) - 1;

/// Time between two step pulses, in microseconds with 16 fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(u64);

impl Interval {
    /// Sentinel used while stopped; never becomes due.
    pub const INFINITE: Self = Self(u64::MAX);

    /// Whole microseconds.
    #[inline]
    pub const fn from_micros(us: u32) -> Self {
        Self((us as u64) << FRAC_BITS)
    }

    /// Interval between pulses at `pulses_per_sec`.
    #[inline]
    pub const fn from_speed(pulses_per_sec: u32) -> Self {
        if pulses_per_sec == 0 {
            Self::INFINITE
        } else {
            Self(((ONE_SECOND as u64) << FRAC_BITS) / pulses_per_sec as u64)
        }
    }

    /// Raw fixed-point value.
    #[inline]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw fixed-point value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whole microseconds, saturated to `u32::MAX`.
    #[inline]
    pub fn whole_micros(self) -> u32 {
        let whole = self.0 >> FRAC_BITS;
        if whole > u32::MAX as u64 {
            u32::MAX
        } else {
            whole as u32
        }
    }

    /// Microseconds rounded to nearest.
    #[inline]
    pub(crate) fn rounded_micros(self) -> u64 {
        self.0.saturating_add(1 << (FRAC_BITS - 1)) >> FRAC_BITS
    }

    /// Pulse rate this interval corresponds to.
    #[inline]
    pub fn speed(self) -> u32 {
        if self.0 == 0 || self == Self::INFINITE {
            return 0;
        }
        let speed = ((ONE_SECOND as u64) << FRAC_BITS) / self.0;
        if speed > u32::MAX as u64 {
            u32::MAX
        } else {
            speed as u32
        }
    }
}

/// Spreads the remainder of `ONE_SECOND / speed` over `speed` pulses.
///
/// Over any `speed` consecutive pulses exactly `remainder` extra microseconds
/// are handed out, so the cruise rate is exact on average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunCorrection {
    remainder: u32,
    divisor: u32,
    counter: u32,
}

impl RunCorrection {
    /// Whole-microsecond base interval at `speed` and its remainder corrector.
    pub fn for_speed(speed: u32) -> (Interval, Self) {
        if speed == 0 {
            return (Interval::INFINITE, Self::default());
        }
        let base = Interval::from_micros(ONE_SECOND / speed);
        let correction = Self {
            remainder: ONE_SECOND % speed,
            divisor: speed,
            counter: 0,
        };
        (base, correction)
    }

    /// Extra microseconds (0 or 1) to add to the next step.
    #[inline]
    pub fn next(&mut self) -> u32 {
        if self.divisor == 0 {
            return 0;
        }
        self.counter += self.remainder;
        if self.counter >= self.divisor {
            self.counter -= self.divisor;
            1
        } else {
            0
        }
    }
}

/// Tracks when the last pulse was due and when the next one is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimer {
    last_step_time: u32,
    interval: Interval,
    carry: u64,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self {
            last_step_time: 0,
            interval: Interval::INFINITE,
            carry: 0,
        }
    }
}

impl StepTimer {
    /// Arm the timer so the first pulse is due at `now`.
    pub fn start(&mut self, now: u32, interval: Interval) {
        self.interval = interval;
        self.last_step_time = now.wrapping_sub(interval.whole_micros());
        self.carry = 0;
    }

    /// Return to the stopped sentinel.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Time of the last pulse (logical, not the time it was observed).
    #[inline]
    pub fn last_step_time(&self) -> u32 {
        self.last_step_time
    }

    /// Current interval.
    #[inline]
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Replace the interval used for the next pulse.
    #[inline]
    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    /// Replace the interval and drop any accumulated fraction.
    #[inline]
    pub fn set_interval_exact(&mut self, interval: Interval) {
        self.interval = interval;
        self.carry = 0;
    }

    /// Whether the next pulse is due. Wrap-safe.
    #[inline]
    pub fn is_due(&self, now: u32) -> bool {
        now.wrapping_sub(self.last_step_time) >= self.interval.whole_micros()
    }

    /// Move the logical step time forward by one interval plus `extra` µs.
    ///
    /// The fractional part of the interval is carried into the next advance.
    #[inline]
    pub fn advance(&mut self, extra: u32) {
        let total = self.interval.raw().saturating_add(self.carry);
        let whole = (total >> FRAC_BITS) as u32;
        self.carry = total & FRAC_MASK;
        self.last_step_time = self
            .last_step_time
            .wrapping_add(whole)
            .wrapping_add(extra);
    }

    #[cfg(test)]
    pub(crate) fn set_last_step_time(&mut self, t: u32) {
        self.last_step_time = t;
    }
}
