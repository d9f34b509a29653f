//! Error types for stepper-ramp.
//!
//! Every failure is local and recoverable: an operation that returns an error
//! leaves the motor exactly as it was before the call.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-ramp operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motor operation error
    Motor(MotorError),
    /// Motion planning error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be power of 2: 1, 2, 4, 8, 16, 32, 64, 128, 256)
    InvalidMicrosteps(u16),
    /// Drive mode finer than the position resolution
    MicrostepsExceedResolution {
        /// Requested microstep divisor
        microsteps: u16,
        /// Configured position resolution
        resolution: u16,
    },
    /// Motor name not found in configuration
    MotorNotFound(heapless::String<32>),
    /// Invalid travel limits (forward must be >= reverse)
    InvalidLimits {
        /// Forward limit in position units
        forward: i64,
        /// Reverse limit in position units
        reverse: i64,
    },
    /// Invalid step pulse width (must be > 0)
    InvalidPulseWidth(u32),
    /// A required builder field was not provided
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motor operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin or pulse emitter operation failed
    PinError,
    /// A move is in progress; the request needs the motor to be stopped
    Busy,
    /// Current position would fall outside the requested limits
    LimitExceeded {
        /// Current position
        position: i64,
        /// Limit that excludes it
        limit: i64,
    },
}

/// Motion planning errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The clamped target is already reached (or closer than one pulse)
    AlreadyAtTarget,
    /// Maximum speed is zero at the active drive mode
    ZeroSpeed,
    /// Move distance does not fit the pulse counter
    Overflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32, 64, 128, 256", v)
            }
            ConfigError::MicrostepsExceedResolution { microsteps, resolution } => {
                write!(f, "Microsteps {} exceed position resolution {}", microsteps, resolution)
            }
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            ConfigError::InvalidLimits { forward, reverse } => {
                write!(f, "Invalid limits: forward ({}) must be >= reverse ({})", forward, reverse)
            }
            ConfigError::InvalidPulseWidth(v) => write!(f, "Invalid pulse width: {} us. Must be > 0", v),
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::Busy => write!(f, "Motor is moving"),
            MotorError::LimitExceeded { position, limit } => {
                write!(f, "Position {} exceeds limit {}", position, limit)
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::AlreadyAtTarget => write!(f, "Already at target"),
            MotionError::ZeroSpeed => write!(f, "Maximum speed is zero"),
            MotionError::Overflow => write!(f, "Move distance overflows the pulse counter"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
