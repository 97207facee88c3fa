//! Linux sysfs GPIO lines as `embedded-hal` pins.
//!
//! ```text
//!   <root>/export            ← "<pin>"
//!   <root>/gpio<pin>/direction ← "in" | "out"
//!   <root>/gpio<pin>/value     ↔ "0" | "1"
//!   <root>/unexport          ← "<pin>"
//! ```
//!
//! The root defaults to `/sys/class/gpio` and is configurable so tests can
//! point it at a scratch directory.

use std::fs;
use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::warn;

use crate::error::GpioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// Ask the kernel to expose `pin` under `root`.
pub fn export(root: impl AsRef<Path>, pin: u8) -> Result<(), GpioError> {
    let root = root.as_ref();
    if root.join(format!("gpio{pin}")).exists() {
        return Ok(());
    }
    fs::write(root.join("export"), pin.to_string()).map_err(|e| {
        warn!("WARNING: GPIO export of {pin} failed: {e}");
        GpioError::Export(pin)
    })
}

#[derive(Debug)]
pub struct SysfsPin {
    root: PathBuf,
    pin: u8,
}

impl SysfsPin {
    /// Configure an exported line.
    pub fn open(root: impl AsRef<Path>, pin: u8, direction: Direction) -> Result<Self, GpioError> {
        let p = Self {
            root: root.as_ref().to_path_buf(),
            pin,
        };
        fs::write(p.line().join("direction"), direction.as_str()).map_err(|e| {
            warn!("WARNING: GPIO {pin} direction {} failed: {e}", direction.as_str());
            GpioError::Direction(pin)
        })?;
        Ok(p)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn unexport(self) -> Result<(), GpioError> {
        let pin = self.pin;
        fs::write(self.root.join("unexport"), pin.to_string()).map_err(|e| {
            warn!("WARNING: GPIO unexport of {pin} failed: {e}");
            GpioError::Unexport(pin)
        })
    }

    fn line(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    fn write_value(&mut self, high: bool) -> Result<(), GpioError> {
        fs::write(self.line().join("value"), if high { "1" } else { "0" })
            .map_err(|_| GpioError::Write(self.pin))
    }

    fn read_value(&mut self) -> Result<bool, GpioError> {
        let text = fs::read_to_string(self.line().join("value"))
            .map_err(|_| GpioError::Read(self.pin))?;
        Ok(text.trim().parse::<i32>().is_ok_and(|v| v != 0))
    }
}

impl ErrorType for SysfsPin {
    type Error = GpioError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), GpioError> {
        self.write_value(false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.write_value(true)
    }
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        self.read_value()
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        self.read_value().map(|v| !v)
    }
}
