//! Ramp scheduler - the per-tick step state machine.
//!
//! The scheduler owns no hardware. The motor asks it whether a pulse is due,
//! emits the pulse, and only then reports it back through [`RampScheduler::on_pulse`].
//! Distance therefore only advances for pulses that actually went out.

use crate::error::MotorError;
use crate::motor::MoveState;

use super::profile::MotionProfile;
use super::ramp::RampPolicy;
use super::timing::{Interval, RunCorrection, StepTimer};

/// Executes one [`MotionProfile`] pulse by pulse.
#[derive(Debug, Clone)]
pub struct RampScheduler {
    state: MoveState,
    profile: MotionProfile,
    policy: RampPolicy,
    accel: u32,
    distance_moved: u32,
    timer: StepTimer,
    run_correction: RunCorrection,
    top_interval: Interval,
    start_interval: Interval,
}

impl Default for RampScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RampScheduler {
    /// Create a stopped scheduler.
    pub fn new() -> Self {
        Self {
            state: MoveState::Stopped,
            profile: MotionProfile {
                dist_total: 0,
                dist_accel: 0,
                dist_run: 0,
                direction: Default::default(),
                top_speed: 0,
                start_speed: 0,
            },
            policy: RampPolicy::Constant,
            accel: 0,
            distance_moved: 0,
            timer: StepTimer::default(),
            run_correction: RunCorrection::default(),
            top_interval: Interval::INFINITE,
            start_interval: Interval::INFINITE,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Profile of the active move.
    #[inline]
    pub fn profile(&self) -> Option<&MotionProfile> {
        if self.state.is_active() {
            Some(&self.profile)
        } else {
            None
        }
    }

    /// Pulses emitted since the move started and not yet committed.
    #[inline]
    pub fn distance_moved(&self) -> u32 {
        self.distance_moved
    }

    /// Pulses left in the active move.
    #[inline]
    pub fn remaining(&self) -> u32 {
        if self.state.is_active() {
            self.profile.dist_total.saturating_sub(self.distance_moved)
        } else {
            0
        }
    }

    /// Current step interval in whole microseconds; `u32::MAX` while stopped.
    #[inline]
    pub fn step_interval(&self) -> u32 {
        self.timer.interval().whole_micros()
    }

    /// Logical time of the last pulse.
    #[inline]
    pub fn last_step_time(&self) -> u32 {
        self.timer.last_step_time()
    }

    /// Instantaneous speed in pulses/s; 0 while stopped.
    ///
    /// The run phase reports the top speed: its whole-µs interval alone
    /// would read slightly fast.
    #[inline]
    pub fn current_speed(&self) -> u32 {
        match self.state {
            MoveState::Stopped => 0,
            MoveState::Run => self.profile.top_speed,
            _ => self.timer.interval().speed(),
        }
    }

    /// Accept a planned move. The first pulse is due immediately.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::Busy` if a move is already active; the active
    /// profile is left untouched.
    pub fn start(&mut self, profile: MotionProfile, accel: u32, now: u32) -> Result<(), MotorError> {
        if self.state.is_active() {
            return Err(MotorError::Busy);
        }

        self.profile = profile;
        self.accel = accel;
        self.policy = RampPolicy::for_accel(accel);
        self.distance_moved = 0;
        self.top_interval = Interval::from_speed(profile.top_speed);
        self.start_interval = if self.policy.is_ramped() {
            Interval::from_speed(profile.start_speed)
        } else {
            self.top_interval
        };
        self.run_correction = RunCorrection::default();
        self.timer.start(now, self.start_interval);
        self.state = MoveState::Starting;

        trace!(
            "scheduler start: total={} accel={} run={}",
            profile.dist_total,
            profile.dist_accel,
            profile.dist_run
        );
        Ok(())
    }

    /// Leave `Starting` for the first phase with a nonzero length.
    ///
    /// The clock baseline is re-captured at `now` so a late first tick does
    /// not produce a burst of catch-up pulses.
    pub fn enter_first_phase(&mut self, now: u32) -> MoveState {
        if self.state != MoveState::Starting {
            return self.state;
        }

        self.timer.start(now, self.start_interval);
        let p = self.profile;
        if p.dist_accel > 0 {
            self.state = MoveState::Accel;
        } else if p.dist_run > 0 {
            self.enter_run();
        } else if p.dist_total > 0 {
            self.state = MoveState::Decel;
        } else {
            self.halt();
        }

        trace!("first phase: {}", self.state);
        self.state
    }

    /// Whether a pulse is due at `now`.
    #[inline]
    pub fn is_due(&self, now: u32) -> bool {
        self.state.is_moving() && self.timer.is_due(now)
    }

    /// Record one emitted pulse and update interval and phase.
    pub fn on_pulse(&mut self) -> MoveState {
        if !self.state.is_moving() {
            return self.state;
        }

        self.distance_moved += 1;
        let extra = if self.state == MoveState::Run {
            self.run_correction.next()
        } else {
            0
        };
        self.timer.advance(extra);

        let moved = self.distance_moved;
        let p = self.profile;
        match self.state {
            MoveState::Run => {
                if moved >= p.dist_run {
                    if p.dist_run >= p.dist_total {
                        self.halt();
                    } else {
                        self.enter_decel();
                    }
                }
            }
            MoveState::Accel => {
                if let RampPolicy::Linear(rate) = self.policy {
                    let next = rate.accelerate(self.timer.interval(), self.top_interval);
                    self.timer.set_interval(next);
                }
                if moved >= p.dist_accel {
                    if p.dist_run > p.dist_accel {
                        self.enter_run();
                    } else if p.dist_total > p.dist_run {
                        self.state = MoveState::Decel;
                    } else {
                        self.halt();
                    }
                    trace!("accel done at {}: {}", moved, self.state);
                }
            }
            MoveState::Decel => {
                if let RampPolicy::Linear(rate) = self.policy {
                    let next = rate.decelerate(self.timer.interval(), self.start_interval);
                    self.timer.set_interval(next);
                }
                if moved >= p.dist_total {
                    self.halt();
                }
            }
            MoveState::Stopped | MoveState::Starting => {}
        }

        self.state
    }

    /// Shorten the move to the distance needed to stop from the current speed.
    ///
    /// Without acceleration this stops at once. Already decelerating or
    /// stopped: no change.
    pub fn decelerate(&mut self) -> MoveState {
        if matches!(self.state, MoveState::Stopped | MoveState::Decel) {
            return self.state;
        }
        if !self.policy.is_ramped() || self.accel == 0 {
            self.halt();
            return self.state;
        }

        let speed = self.current_speed() as u64;
        let max_decel_dist = (speed / 2) * speed / self.accel as u64;
        let remaining = self.profile.dist_total.saturating_sub(self.distance_moved);
        let decel_dist = max_decel_dist.min(remaining as u64) as u32;

        if decel_dist == 0 {
            self.halt();
            return self.state;
        }

        let moved = self.distance_moved;
        self.profile.dist_total = moved + decel_dist;
        self.profile.dist_accel = moved;
        self.profile.dist_run = moved;
        self.state = MoveState::Decel;

        debug!(
            "decelerate: speed={} stopping in {} pulses",
            speed as u32,
            decel_dist
        );
        self.state
    }

    /// Stop immediately. Distance moved is kept until taken.
    pub fn halt(&mut self) {
        self.state = MoveState::Stopped;
        self.timer.reset();
        self.run_correction = RunCorrection::default();
    }

    /// Take and clear the uncommitted distance.
    #[inline]
    pub fn take_distance_moved(&mut self) -> u32 {
        core::mem::take(&mut self.distance_moved)
    }

    fn enter_run(&mut self) {
        let (base, correction) = RunCorrection::for_speed(self.profile.top_speed);
        self.timer.set_interval_exact(base);
        self.run_correction = correction;
        self.state = MoveState::Run;
    }

    fn enter_decel(&mut self) {
        self.timer.set_interval_exact(self.top_interval);
        self.state = MoveState::Decel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::profile::Direction;
    use crate::motion::timing::ONE_SECOND;

    fn plan(distance: u32, max_speed: u32, accel: u32) -> MotionProfile {
        MotionProfile::plan(distance, Direction::Forward, max_speed, accel).unwrap()
    }

    /// Drive the scheduler with a simulated clock, firing each pulse exactly when due.
    /// Returns the logical times of all pulses.
    fn run_to_end(sched: &mut RampScheduler, start: u32) -> Vec<u32> {
        let mut now = start;
        let mut times = Vec::new();
        sched.enter_first_phase(now);
        while sched.state().is_moving() {
            if sched.is_due(now) {
                times.push(now);
                sched.on_pulse();
            } else {
                now = now.wrapping_add(1);
            }
        }
        times
    }

    #[test]
    fn test_stopped_scheduler_never_fires() {
        let mut sched = RampScheduler::new();
        assert!(!sched.is_due(0));
        assert!(!sched.is_due(u32::MAX));
        assert_eq!(sched.on_pulse(), MoveState::Stopped);
        assert_eq!(sched.distance_moved(), 0);
        assert_eq!(sched.step_interval(), u32::MAX);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut sched = RampScheduler::new();
        let first = plan(100, 1000, 0);
        sched.start(first, 0, 0).unwrap();

        assert_eq!(sched.start(plan(50, 10, 0), 0, 0), Err(MotorError::Busy));
        assert_eq!(sched.profile(), Some(&first));
    }

    #[test]
    fn test_starting_picks_first_nonzero_phase() {
        let mut sched = RampScheduler::new();
        sched.start(plan(10_000, 1000, 500), 500, 0).unwrap();
        assert_eq!(sched.state(), MoveState::Starting);
        assert_eq!(sched.enter_first_phase(0), MoveState::Accel);

        let mut sched = RampScheduler::new();
        sched.start(plan(100, 1000, 0), 0, 0).unwrap();
        assert_eq!(sched.enter_first_phase(0), MoveState::Run);

        let mut sched = RampScheduler::new();
        sched.start(plan(1, 1000, 500), 500, 0).unwrap();
        assert_eq!(sched.enter_first_phase(0), MoveState::Decel);
    }

    #[test]
    fn test_flat_move_emits_exact_pulses_at_exact_rate() {
        let mut sched = RampScheduler::new();
        sched.start(plan(7, 7, 0), 0, 0).unwrap();
        let times = run_to_end(&mut sched, 0);

        assert_eq!(times.len(), 7);
        assert_eq!(sched.distance_moved(), 7);
        // First pulse immediately; six intervals of 142857 us and one correction
        // land in the seventh interval, which is never waited for.
        assert_eq!(times[6] - times[0], 6 * 142_857);
    }

    #[test]
    fn test_run_phase_takes_exactly_one_second_per_top_speed_pulses() {
        let mut sched = RampScheduler::new();
        let speed = 333;
        sched.start(plan(speed + 1, speed, 0), 0, 0).unwrap();
        let times = run_to_end(&mut sched, 0);

        assert_eq!(times.len() as u32, speed + 1);
        assert_eq!(times[speed as usize] - times[0], ONE_SECOND);
    }

    #[test]
    fn test_trapezoid_phases_in_order() {
        let mut sched = RampScheduler::new();
        sched.start(plan(3000, 1000, 2000), 2000, 0).unwrap();
        sched.enter_first_phase(0);

        let mut seen = Vec::new();
        let mut now = 0u32;
        while sched.state().is_moving() {
            if seen.last() != Some(&sched.state()) {
                seen.push(sched.state());
            }
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }

        assert_eq!(seen, vec![MoveState::Accel, MoveState::Run, MoveState::Decel]);
        assert_eq!(sched.distance_moved(), 3000);
    }

    #[test]
    fn test_triangle_skips_run() {
        let mut sched = RampScheduler::new();
        sched.start(plan(1000, 1000, 500), 500, 0).unwrap();
        sched.enter_first_phase(0);

        let mut saw_run = false;
        let mut now = 0u32;
        while sched.state().is_moving() {
            saw_run |= sched.state() == MoveState::Run;
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }

        assert!(!saw_run);
        assert_eq!(sched.distance_moved(), 1000);
    }

    #[test]
    fn test_accel_interval_never_below_top_speed() {
        let mut sched = RampScheduler::new();
        sched.start(plan(4000, 1000, 500), 500, 0).unwrap();
        sched.enter_first_phase(0);
        let top = Interval::from_speed(1000).whole_micros();

        let mut now = 0u32;
        while sched.state().is_moving() {
            assert!(sched.step_interval() >= top);
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }
    }

    #[test]
    fn test_first_ramp_step_at_most_doubles_speed() {
        for accel in [1, 3, 500] {
            let profile = plan(1000, 1000, accel);
            let mut sched = RampScheduler::new();
            sched.start(profile, accel, 0).unwrap();
            sched.enter_first_phase(0);

            assert!(sched.is_due(0));
            assert_eq!(sched.on_pulse(), MoveState::Accel);

            let speed = sched.current_speed();
            assert!(
                speed >= profile.start_speed && speed <= 2 * profile.start_speed,
                "accel {}: start {} then {}",
                accel,
                profile.start_speed,
                speed
            );
            assert!(speed < profile.top_speed, "accel {} jumped to top speed", accel);
        }
    }

    #[test]
    fn test_decel_interval_never_above_start_interval() {
        let mut sched = RampScheduler::new();
        let profile = plan(2000, 1000, 500);
        sched.start(profile, 500, 0).unwrap();
        sched.enter_first_phase(0);
        let slowest = Interval::from_speed(profile.start_speed).whole_micros();

        let mut now = 0u32;
        while sched.state().is_moving() {
            assert!(sched.step_interval() <= slowest);
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }
    }

    #[test]
    fn test_ramp_speeds_up_then_slows_down() {
        let mut sched = RampScheduler::new();
        sched.start(plan(2000, 1000, 500), 500, 0).unwrap();
        let times = run_to_end(&mut sched, 0);

        let first_gap = times[1] - times[0];
        let mid_gap = times[1000] - times[999];
        let last_gap = times[1999] - times[1998];
        assert!(first_gap > 4 * mid_gap, "first {} mid {}", first_gap, mid_gap);
        assert!(last_gap > 4 * mid_gap, "last {} mid {}", last_gap, mid_gap);
    }

    #[test]
    fn test_timing_survives_clock_wrap() {
        let mut sched = RampScheduler::new();
        let start = u32::MAX - 5_000;
        sched.start(plan(20, 1000, 0), 0, start).unwrap();
        let times = run_to_end(&mut sched, start);

        assert_eq!(times.len(), 20);
        for pair in times.windows(2) {
            assert_eq!(pair[1].wrapping_sub(pair[0]), 1000);
        }
    }

    #[test]
    fn test_decelerate_mid_run() {
        let mut sched = RampScheduler::new();
        sched.start(plan(10_000, 1000, 500), 500, 0).unwrap();
        sched.enter_first_phase(0);

        let mut now = 0u32;
        while sched.distance_moved() < 3000 {
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }
        assert_eq!(sched.state(), MoveState::Run);

        assert_eq!(sched.decelerate(), MoveState::Decel);
        // v = 1000, v²/2a = 1000
        let profile = *sched.profile().unwrap();
        assert_eq!(profile.dist_total, 4000);
        assert_eq!(profile.dist_accel, 3000);
        assert_eq!(profile.dist_run, 3000);

        while sched.state().is_moving() {
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }
        assert_eq!(sched.distance_moved(), 4000);
    }

    #[test]
    fn test_decelerate_is_clipped_to_remaining() {
        // Cruise that ends with too little room to stop from 1000 pulses/s
        let profile = MotionProfile {
            dist_total: 1200,
            dist_accel: 0,
            dist_run: 1100,
            direction: Direction::Forward,
            top_speed: 1000,
            start_speed: 31,
        };
        let mut sched = RampScheduler::new();
        sched.start(profile, 500, 0).unwrap();
        assert_eq!(sched.enter_first_phase(0), MoveState::Run);

        let mut now = 0u32;
        while sched.distance_moved() < 500 {
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }

        assert_eq!(sched.decelerate(), MoveState::Decel);
        assert_eq!(sched.profile().unwrap().dist_total, 1200);
        assert_eq!(sched.remaining(), 700);
    }

    #[test]
    fn test_decelerate_shortens_long_move() {
        let mut sched = RampScheduler::new();
        sched.start(plan(10_000, 1000, 500), 500, 0).unwrap();
        sched.enter_first_phase(0);

        let mut now = 0u32;
        while sched.distance_moved() < 8500 {
            if sched.is_due(now) {
                sched.on_pulse();
            } else {
                now += 1;
            }
        }

        sched.decelerate();
        assert_eq!(sched.profile().unwrap().dist_total, 9500);
    }

    #[test]
    fn test_decelerate_without_accel_stops() {
        let mut sched = RampScheduler::new();
        sched.start(plan(100, 1000, 0), 0, 0).unwrap();
        sched.enter_first_phase(0);
        sched.on_pulse();

        assert_eq!(sched.decelerate(), MoveState::Stopped);
        assert_eq!(sched.take_distance_moved(), 1);
        assert_eq!(sched.distance_moved(), 0);
    }

    #[test]
    fn test_decelerate_while_decelerating_is_noop() {
        let mut sched = RampScheduler::new();
        sched.start(plan(1, 1000, 500), 500, 0).unwrap();
        sched.enter_first_phase(0);
        let before = *sched.profile().unwrap();

        assert_eq!(sched.decelerate(), MoveState::Decel);
        assert_eq!(*sched.profile().unwrap(), before);
    }
}
