//! Per-step interval update for constant acceleration.
//!
//! Under constant acceleration `a` the next step interval follows
//! `t' = t / (1 ± a·t²)`. For small `q = a·t²` this is `t·(1 ∓ q)`, which only
//! needs multiplies and shifts. `q` is evaluated in Q24 fixed point with the
//! constant `k = a / ONE_SECOND²` pre-scaled by 2^56, so the hot path never
//! divides, never takes a square root and never touches floating point.
//!
//! Every product saturates; the floor/ceiling clamps then pull the result
//! back into the valid range, so large `q` near standstill cannot wrap.

use super::timing::Interval;

/// Scale applied to `k` at setup.
const K_SHIFT: u32 = 56;
/// Fractional bits of `q`.
const Q_SHIFT: u32 = 24;
/// `ONE_SECOND²`.
const MICROS_PER_SEC_SQUARED: u128 = 1_000_000_000_000;

/// Precomputed acceleration constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampRate {
    k: u64,
}

impl RampRate {
    /// Constant for `accel` pulses/s².
    pub fn new(accel: u32) -> Self {
        let k = ((accel as u128) << K_SHIFT) / MICROS_PER_SEC_SQUARED;
        Self { k: k as u64 }
    }

    /// `q = a·t²` in Q24.
    #[inline]
    fn q(self, interval: Interval) -> u64 {
        let us = interval.rounded_micros();
        us.saturating_mul(us).saturating_mul(self.k) >> (K_SHIFT - Q_SHIFT)
    }

    /// `t·q`, the change applied to the interval this step.
    #[inline]
    fn delta(self, interval: Interval) -> u64 {
        interval.raw().saturating_mul(self.q(interval)) >> Q_SHIFT
    }

    /// Next interval while speeding up, never shorter than `floor`.
    #[inline]
    pub fn accelerate(self, interval: Interval, floor: Interval) -> Interval {
        let next = interval.raw().saturating_sub(self.delta(interval));
        Interval::from_raw(next).max(floor)
    }

    /// Next interval while slowing down, never longer than `ceiling`.
    #[inline]
    pub fn decelerate(self, interval: Interval, ceiling: Interval) -> Interval {
        let next = interval.raw().saturating_add(self.delta(interval));
        Interval::from_raw(next).min(ceiling)
    }
}

/// How the scheduler changes speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPolicy {
    /// No acceleration limit: the move runs at top speed from the first pulse.
    Constant,
    /// Linear speed ramp at a fixed acceleration.
    Linear(RampRate),
}

impl RampPolicy {
    /// Pick the policy for `accel` pulses/s².
    pub fn for_accel(accel: u32) -> Self {
        if accel == 0 {
            RampPolicy::Constant
        } else {
            RampPolicy::Linear(RampRate::new(accel))
        }
    }

    /// Whether speed changes gradually.
    #[inline]
    pub fn is_ramped(self) -> bool {
        matches!(self, RampPolicy::Linear(_))
    }
}
