//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks every motor entry:
/// - Drive mode is not finer than the position resolution
/// - Step pulse width is non-zero
/// - Travel limits are ordered (forward >= reverse)
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (_, motor) in config.motors.iter() {
        validate_motor(motor)?;
    }
    Ok(())
}

/// Validate a single motor configuration.
pub fn validate_motor(config: &MotorConfig) -> Result<()> {
    config.microsteps.step_size(config.resolution)?;

    if config.pulse_width_us == 0 {
        return Err(Error::Config(ConfigError::InvalidPulseWidth(
            config.pulse_width_us,
        )));
    }

    if let Some(ref limits) = config.limits {
        if !limits.is_valid() {
            return Err(Error::Config(ConfigError::InvalidLimits {
                forward: limits.forward,
                reverse: limits.reverse,
            }));
        }
    }

    Ok(())
}
