//! Unified error types for the heat-pump manager.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binary's error handling uniform.  The control core itself only ever
//! produces [`SensorFault`]; every other anomaly inside a cycle resolves to a
//! rejected actuation or a mode transition.

use core::fmt;

use crate::sensors::SensorId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Sustained sensor loss.  Fatal: actuators must be shut down.
    Sensor(SensorFault),
    /// A GPIO line could not be exported, configured, read or written.
    Gpio(GpioError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Run-cycle counters could not be persisted or loaded.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor fault
// ---------------------------------------------------------------------------

/// Raised by the telemetry filter when a channel has been missing for more
/// consecutive cycles than the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFault {
    pub channel: SensorId,
    pub failures: u16,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "too many sensor read errors on {} ({} consecutive)",
            self.channel, self.failures
        )
    }
}

impl std::error::Error for SensorFault {}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    Export(u8),
    Unexport(u8),
    Direction(u8),
    Read(u8),
    Write(u8),
}

impl GpioError {
    /// BCM number of the line that failed.
    pub fn pin(self) -> u8 {
        match self {
            Self::Export(p) | Self::Unexport(p) | Self::Direction(p) | Self::Read(p) | Self::Write(p) => p,
        }
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export(p) => write!(f, "failed to export GPIO {p}"),
            Self::Unexport(p) => write!(f, "failed to unexport GPIO {p}"),
            Self::Direction(p) => write!(f, "failed to set direction of GPIO {p}"),
            Self::Read(p) => write!(f, "failed to read GPIO {p}"),
            Self::Write(p) => write!(f, "failed to write GPIO {p}"),
        }
    }
}

impl std::error::Error for GpioError {}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file at the expected path.
    NotFound,
    /// The file exists but could not be read.
    Io,
    /// The file is not valid TOML or has wrongly typed keys.
    Parse(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Io => write!(f, "config unreadable"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing stored yet.
    NotFound,
    /// Stored data failed to deserialize.
    Corrupted,
    /// Generic I/O error from the backing file.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored counters"),
            Self::Corrupted => write!(f, "stored counters corrupted"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
