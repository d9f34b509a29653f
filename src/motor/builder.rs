//! Builder pattern for StepperMotor.
//!
//! Hardware parts are added with type-changing setters, so a motor missing its
//! pulse output, DIR pin or clock does not compile. Motion parameters come
//! from individual setters or a [`MotorConfig`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{Microsteps, MotorConfig, SystemConfig, TravelLimits};
use crate::error::{ConfigError, Error, Result};
use crate::io::{MicrosClock, NoPin, PulseEmitter, StepPulse};

use super::driver::StepperMotor;
use super::position::PositionTracker;

/// Builder for creating StepperMotor instances.
pub struct StepperMotorBuilder<EMIT = (), DIR = (), CLK = (), EN = NoPin> {
    emitter: EMIT,
    dir_pin: DIR,
    clock: CLK,
    enable_pin: EN,
    name: Option<heapless::String<32>>,
    resolution: Microsteps,
    microsteps: Microsteps,
    max_speed: Option<u32>,
    acceleration: u32,
    invert_direction: bool,
    enable_active_low: bool,
    pulse_width_us: u32,
    limits: TravelLimits,
}

impl Default for StepperMotorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StepperMotorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            emitter: (),
            dir_pin: (),
            clock: (),
            enable_pin: NoPin,
            name: None,
            resolution: Microsteps::default(),
            microsteps: Microsteps::default(),
            max_speed: None,
            acceleration: 0,
            invert_direction: false,
            enable_active_low: true,
            pulse_width_us: 2,
            limits: TravelLimits::unbounded(),
        }
    }
}

impl<EMIT, DIR, CLK, EN> StepperMotorBuilder<EMIT, DIR, CLK, EN> {
    fn with_parts<E, D, C, N>(
        self,
        emitter: E,
        dir_pin: D,
        clock: C,
        enable_pin: N,
    ) -> StepperMotorBuilder<E, D, C, N> {
        StepperMotorBuilder {
            emitter,
            dir_pin,
            clock,
            enable_pin,
            name: self.name,
            resolution: self.resolution,
            microsteps: self.microsteps,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            invert_direction: self.invert_direction,
            enable_active_low: self.enable_active_low,
            pulse_width_us: self.pulse_width_us,
            limits: self.limits,
        }
    }

    /// Set the pulse output.
    pub fn emitter<E: PulseEmitter>(self, emitter: E) -> StepperMotorBuilder<E, DIR, CLK, EN> {
        let (_, dir, clock, en, rest) = self.split_parts();
        rest.with_parts(emitter, dir, clock, en)
    }

    /// Pulse a STEP pin through a delay provider.
    ///
    /// Uses the pulse width configured so far, so call this after
    /// [`from_motor_config`](Self::from_motor_config).
    pub fn step_pin<STEP, DELAY>(
        self,
        step_pin: STEP,
        delay: DELAY,
    ) -> StepperMotorBuilder<StepPulse<STEP, DELAY>, DIR, CLK, EN>
    where
        STEP: OutputPin,
        DELAY: DelayNs,
    {
        let pulse = StepPulse::new(step_pin, delay, self.pulse_width_us);
        self.emitter(pulse)
    }

    /// Set the DIR pin.
    pub fn dir_pin<D: OutputPin>(self, pin: D) -> StepperMotorBuilder<EMIT, D, CLK, EN> {
        let (emitter, _, clock, en, rest) = self.split_parts();
        rest.with_parts(emitter, pin, clock, en)
    }

    /// Set the clock.
    pub fn clock<C: MicrosClock>(self, clock: C) -> StepperMotorBuilder<EMIT, DIR, C, EN> {
        let (emitter, dir, _, en, rest) = self.split_parts();
        rest.with_parts(emitter, dir, clock, en)
    }

    /// Set the enable pin.
    pub fn enable_pin<N: OutputPin>(self, pin: N) -> StepperMotorBuilder<EMIT, DIR, CLK, N> {
        let (emitter, dir, clock, _, rest) = self.split_parts();
        rest.with_parts(emitter, dir, clock, pin)
    }

    /// Set the motor name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = heapless::String::try_from(name).ok();
        self
    }

    /// Set the position resolution (units per full step).
    pub fn resolution(mut self, resolution: Microsteps) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the initial drive mode.
    pub fn microsteps(mut self, microsteps: Microsteps) -> Self {
        self.microsteps = microsteps;
        self
    }

    /// Set maximum speed in units per second.
    pub fn max_speed(mut self, speed: u32) -> Self {
        self.max_speed = Some(speed);
        self
    }

    /// Set acceleration in units per second squared.
    pub fn acceleration(mut self, accel: u32) -> Self {
        self.acceleration = accel;
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set enable pin polarity.
    pub fn enable_active_low(mut self, active_low: bool) -> Self {
        self.enable_active_low = active_low;
        self
    }

    /// Set STEP high time for [`step_pin`](Self::step_pin).
    pub fn pulse_width_us(mut self, width: u32) -> Self {
        self.pulse_width_us = width;
        self
    }

    /// Set travel limits.
    pub fn limits(mut self, limits: TravelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Configure from a MotorConfig.
    pub fn from_motor_config(mut self, config: &MotorConfig) -> Self {
        self.name = Some(config.name.clone());
        self.resolution = config.resolution;
        self.microsteps = config.microsteps;
        self.max_speed = Some(config.max_speed);
        self.acceleration = config.acceleration;
        self.invert_direction = config.invert_direction;
        self.enable_active_low = config.enable_active_low;
        self.pulse_width_us = config.pulse_width_us;
        self.limits = config.travel_limits();
        self
    }

    /// Configure from SystemConfig by motor name.
    pub fn from_config(self, config: &SystemConfig, motor_name: &str) -> Result<Self> {
        let motor_config = config.motor(motor_name).ok_or_else(|| {
            Error::Config(ConfigError::MotorNotFound(
                heapless::String::try_from(motor_name).unwrap_or_default(),
            ))
        })?;

        Ok(self.from_motor_config(motor_config))
    }

    #[allow(clippy::type_complexity)]
    fn split_parts(self) -> (EMIT, DIR, CLK, EN, StepperMotorBuilder<(), (), (), ()>) {
        let rest = StepperMotorBuilder {
            emitter: (),
            dir_pin: (),
            clock: (),
            enable_pin: (),
            name: self.name,
            resolution: self.resolution,
            microsteps: self.microsteps,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            invert_direction: self.invert_direction,
            enable_active_low: self.enable_active_low,
            pulse_width_us: self.pulse_width_us,
            limits: self.limits,
        };
        (self.emitter, self.dir_pin, self.clock, self.enable_pin, rest)
    }
}

impl<EMIT, DIR, CLK, EN> StepperMotorBuilder<EMIT, DIR, CLK, EN>
where
    EMIT: PulseEmitter,
    DIR: OutputPin,
    CLK: MicrosClock,
    EN: OutputPin,
{
    /// Build the StepperMotor and bring it to its initial state (see
    /// [`StepperMotor::begin`]).
    ///
    /// # Errors
    ///
    /// Returns an error if max speed is missing, the drive mode is finer than
    /// the resolution, the limits are inverted, or a pin cannot be driven.
    pub fn build(self) -> Result<StepperMotor<EMIT, DIR, CLK, EN>> {
        let max_speed = self
            .max_speed
            .ok_or(Error::Config(ConfigError::MissingField("max_speed")))?;

        if self.pulse_width_us == 0 {
            return Err(Error::Config(ConfigError::InvalidPulseWidth(0)));
        }

        let tracker = PositionTracker::new(self.resolution, self.microsteps, self.limits)?;
        let name = self.name.unwrap_or_else(|| {
            let mut name = heapless::String::new();
            let _ = name.push_str("motor");
            name
        });

        let mut motor = StepperMotor::new(
            self.emitter,
            self.dir_pin,
            self.enable_pin,
            self.clock,
            tracker,
            name,
            max_speed,
            self.acceleration,
            self.invert_direction,
            self.enable_active_low,
        );
        motor.begin()?;
        Ok(motor)
    }
}
