//! Stepper motor driver.
//!
//! Generic over the pulse output, embedded-hal 1.0 direction/enable pins and
//! a microsecond clock. The host calls [`StepperMotor::tick`] as often as it
//! can; each call emits at most one pulse and never blocks longer than the
//! pulse width.

use embedded_hal::digital::OutputPin;

use crate::config::{Microsteps, TravelLimits};
use crate::error::{Error, MotionError, MotorError, Result};
use crate::io::{MicrosClock, NoPin, PulseEmitter};
use crate::motion::{Direction, MotionProfile, RampScheduler};

use super::position::PositionTracker;
use super::state::MoveState;

/// Single-axis stepper motor with ramped moves.
///
/// Generic over:
/// - `EMIT`: pulse output (see [`crate::io::StepPulse`])
/// - `DIR`: DIR pin (must implement `OutputPin`)
/// - `CLK`: microsecond clock (must implement [`MicrosClock`])
/// - `EN`: enable pin, [`NoPin`] when the driver has none
pub struct StepperMotor<EMIT, DIR, CLK, EN = NoPin>
where
    EMIT: PulseEmitter,
    DIR: OutputPin,
    CLK: MicrosClock,
    EN: OutputPin,
{
    /// STEP output.
    emitter: EMIT,

    /// DIR pin (high = forward, or inverted).
    dir_pin: DIR,

    /// Enable pin.
    enable_pin: EN,

    /// Time source for step scheduling.
    clock: CLK,

    /// Committed position, limits and drive mode.
    tracker: PositionTracker,

    /// Step state machine for the current move.
    scheduler: RampScheduler,

    /// Motor name for logging/debugging.
    name: heapless::String<32>,

    /// Maximum speed in units/s.
    max_speed: u32,

    /// Acceleration in units/s².
    accel: u32,

    /// Direction of the current (or last) move.
    direction: Direction,

    /// Reachable target of the active move.
    target: i64,

    invert_direction: bool,
    enable_active_low: bool,
    enabled: bool,
}

impl<EMIT, DIR, CLK, EN> StepperMotor<EMIT, DIR, CLK, EN>
where
    EMIT: PulseEmitter,
    DIR: OutputPin,
    CLK: MicrosClock,
    EN: OutputPin,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        emitter: EMIT,
        dir_pin: DIR,
        enable_pin: EN,
        clock: CLK,
        tracker: PositionTracker,
        name: heapless::String<32>,
        max_speed: u32,
        accel: u32,
        invert_direction: bool,
        enable_active_low: bool,
    ) -> Self {
        Self {
            emitter,
            dir_pin,
            enable_pin,
            clock,
            tracker,
            scheduler: RampScheduler::new(),
            name,
            max_speed,
            accel,
            direction: Direction::Forward,
            target: tracker.position(),
            invert_direction,
            enable_active_low,
            enabled: false,
        }
    }

    /// Get the motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Bring the outputs to a known state: stopped, disabled, direction
    /// forward, position 0 (clamped into the limits).
    pub fn begin(&mut self) -> Result<()> {
        if self.scheduler.state().is_active() {
            self.scheduler.halt();
            self.scheduler.take_distance_moved();
        }
        self.disable()?;
        self.write_direction(Direction::Forward)?;
        self.direction = Direction::Forward;
        self.target = self.tracker.set_position(0);
        debug!("{}: begin", self.name.as_str());
        Ok(())
    }

    /// Energize the driver.
    pub fn enable(&mut self) -> Result<()> {
        self.write_enable(true)?;
        self.enabled = true;
        Ok(())
    }

    /// Hard-stop any move and de-energize the driver.
    pub fn disable(&mut self) -> Result<()> {
        self.stop();
        self.write_enable(false)?;
        self.enabled = false;
        Ok(())
    }

    /// Whether the driver is energized.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the maximum speed in units/s.
    pub fn set_max_speed(&mut self, speed: u32) -> Result<()> {
        self.ensure_stopped()?;
        self.max_speed = speed;
        Ok(())
    }

    /// Maximum speed in units/s.
    #[inline]
    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    /// Set the acceleration in units/s². 0 disables ramping.
    pub fn set_accel(&mut self, accel: u32) -> Result<()> {
        self.ensure_stopped()?;
        self.accel = accel;
        Ok(())
    }

    /// Acceleration in units/s².
    #[inline]
    pub fn accel(&self) -> u32 {
        self.accel
    }

    /// Switch drive mode. Position is preserved.
    pub fn set_drive_mode(&mut self, mode: Microsteps) -> Result<()> {
        self.ensure_stopped()?;
        self.tracker.set_drive_mode(mode)?;
        debug!("{}: drive mode 1/{}", self.name.as_str(), mode.value());
        Ok(())
    }

    /// Active drive mode.
    #[inline]
    pub fn drive_mode(&self) -> Microsteps {
        self.tracker.drive_mode()
    }

    /// Plan a move to `target` units. The first pulse goes out on the next tick.
    ///
    /// The target is clamped into the travel limits and rounded toward the
    /// current position onto the drive-mode grid.
    ///
    /// # Errors
    ///
    /// - `MotorError::Busy` if a move is active
    /// - `MotionError::AlreadyAtTarget` if no whole pulse separates position and target
    /// - `MotionError::ZeroSpeed` if max speed is below one pulse/s
    /// - `MotionError::Overflow` if the move exceeds `u32::MAX` pulses
    /// - `MotorError::PinError` if the direction or enable line cannot be driven
    pub fn prepare_move(&mut self, target: i64) -> Result<()> {
        self.ensure_stopped()?;

        let clamped = self.tracker.clamp(target);
        let (pulses, direction) = self.tracker.pulses_to(clamped);
        let pulses = u32::try_from(pulses).map_err(|_| MotionError::Overflow)?;
        if pulses == 0 {
            return Err(MotionError::AlreadyAtTarget.into());
        }

        let max_speed = self.tracker.to_pulses(self.max_speed);
        let accel = if self.accel == 0 {
            0
        } else {
            self.tracker.to_pulses(self.accel).max(1)
        };
        let profile = MotionProfile::plan(pulses, direction, max_speed, accel)?;

        self.write_direction(direction)?;
        if !self.enabled {
            self.enable()?;
        }

        let now = self.clock.now_micros();
        self.scheduler.start(profile, accel, now)?;
        self.direction = direction;
        self.target = self.tracker.offset(direction, pulses);

        debug!(
            "{}: move {} -> {} ({} pulses, top {} p/s)",
            self.name.as_str(),
            self.tracker.position(),
            self.target,
            pulses,
            profile.top_speed
        );
        Ok(())
    }

    /// Advance the active move by at most one pulse.
    ///
    /// Returns the state after this call. While stopped this does nothing.
    ///
    /// # Errors
    ///
    /// `MotorError::PinError` if the pulse could not be emitted; the move
    /// stays where it was and the pulse is retried on the next tick.
    pub fn tick(&mut self) -> Result<MoveState> {
        let state = self.scheduler.state();
        if !state.is_active() {
            return Ok(state);
        }

        let now = self.clock.now_micros();
        if state == MoveState::Starting
            && self.scheduler.enter_first_phase(now) == MoveState::Stopped
        {
            self.finish_move();
            return Ok(MoveState::Stopped);
        }

        if !self.scheduler.is_due(now) {
            return Ok(self.scheduler.state());
        }

        if self.emitter.emit().is_err() {
            warn!("{}: pulse failed", self.name.as_str());
            return Err(MotorError::PinError.into());
        }

        let state = self.scheduler.on_pulse();
        if state == MoveState::Stopped {
            self.finish_move();
        }
        Ok(state)
    }

    /// Abort the move immediately, keeping the pulses already emitted.
    pub fn stop(&mut self) {
        if self.scheduler.state().is_active() {
            self.scheduler.halt();
            self.finish_move();
        }
    }

    /// Ramp down to rest as quickly as the acceleration allows.
    ///
    /// Returns the new state; `Stopped` when no ramp is configured or the
    /// motor is already slow enough to stop on the spot.
    pub fn decelerate(&mut self) -> MoveState {
        let was_active = self.scheduler.state().is_active();
        let state = self.scheduler.decelerate();
        if let Some(profile) = self.scheduler.profile() {
            self.target = self.tracker.offset(self.direction, profile.dist_total);
        } else if was_active {
            self.finish_move();
        }
        state
    }

    /// Current position in units, including pulses of the active move.
    #[inline]
    pub fn pos(&self) -> i64 {
        if self.scheduler.state().is_active() {
            self.tracker.offset(self.direction, self.scheduler.distance_moved())
        } else {
            self.tracker.position()
        }
    }

    /// Where the active move ends; the current position while stopped.
    #[inline]
    pub fn target(&self) -> i64 {
        if self.scheduler.state().is_active() {
            self.target
        } else {
            self.tracker.position()
        }
    }

    /// Move state.
    #[inline]
    pub fn state(&self) -> MoveState {
        self.scheduler.state()
    }

    /// Redefine the current position. Clamped into the limits.
    pub fn set_pos(&mut self, pos: i64) -> Result<()> {
        self.ensure_stopped()?;
        self.target = self.tracker.set_position(pos);
        Ok(())
    }

    /// Set the forward travel limit.
    pub fn set_forward_limit(&mut self, limit: i64) -> Result<()> {
        let reverse = self.tracker.limits().reverse;
        self.set_limits(TravelLimits::new(reverse, limit))
    }

    /// Forward travel limit.
    #[inline]
    pub fn forward_limit(&self) -> i64 {
        self.tracker.limits().forward
    }

    /// Set the reverse travel limit.
    pub fn set_reverse_limit(&mut self, limit: i64) -> Result<()> {
        let forward = self.tracker.limits().forward;
        self.set_limits(TravelLimits::new(limit, forward))
    }

    /// Reverse travel limit.
    #[inline]
    pub fn reverse_limit(&self) -> i64 {
        self.tracker.limits().reverse
    }

    /// Replace both travel limits.
    pub fn set_limits(&mut self, limits: TravelLimits) -> Result<()> {
        self.ensure_stopped()?;
        self.tracker.set_limits(limits)
    }

    /// Instantaneous speed in units/s; 0 while stopped.
    #[inline]
    pub fn current_speed(&self) -> u32 {
        self.scheduler
            .current_speed()
            .saturating_mul(self.tracker.step_size() as u32)
    }

    /// Current step interval in µs; `u32::MAX` while stopped.
    #[inline]
    pub fn step_interval(&self) -> u32 {
        self.scheduler.step_interval()
    }

    /// Profile of the active move, in pulses.
    #[inline]
    pub fn profile(&self) -> Option<&MotionProfile> {
        self.scheduler.profile()
    }

    /// Borrow the pulse output.
    #[inline]
    pub fn emitter(&self) -> &EMIT {
        &self.emitter
    }

    /// Tick until the active move finishes (blocking).
    pub fn run_to_completion(&mut self) -> Result<()> {
        while self.tick()?.is_active() {}
        Ok(())
    }

    /// Give back the owned hardware.
    pub fn release(self) -> (EMIT, DIR, CLK, EN) {
        (self.emitter, self.dir_pin, self.clock, self.enable_pin)
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.scheduler.state().is_active() {
            warn!("{}: rejected, move in progress", self.name.as_str());
            return Err(Error::Motor(MotorError::Busy));
        }
        Ok(())
    }

    fn finish_move(&mut self) {
        let moved = self.scheduler.take_distance_moved();
        self.tracker.commit(self.direction, moved);
        self.target = self.tracker.position();
        debug!(
            "{}: stopped at {} after {} pulses",
            self.name.as_str(),
            self.tracker.position(),
            moved
        );
    }

    fn write_direction(&mut self, direction: Direction) -> Result<()> {
        let pin_high = match direction {
            Direction::Forward => !self.invert_direction,
            Direction::Backward => self.invert_direction,
        };

        let res = if pin_high {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        res.map_err(|_| Error::Motor(MotorError::PinError))
    }

    fn write_enable(&mut self, on: bool) -> Result<()> {
        let pin_high = on != self.enable_active_low;
        let res = if pin_high {
            self.enable_pin.set_high()
        } else {
            self.enable_pin.set_low()
        };
        res.map_err(|_| Error::Motor(MotorError::PinError))
    }
}
