//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the 1-Wire sensor paths, the relay bank and the comms lines,
//! exposing them through [`SensorPort`] and [`GpioPort`].  This is the
//! only module in the system that touches actual hardware.

use log::{info, warn};

use crate::actuators::ActuatorMask;
use crate::app::ports::{GpioPort, SensorPort};
use crate::config::{HardwareConfig, SensorPaths};
use crate::control::demand::DemandLines;
use crate::control::handshake::HandshakeResponse;
use crate::drivers::comms::CommsLines;
use crate::drivers::relay::RelayBank;
use crate::error::GpioError;
use crate::sensors::{RawReadings, SensorId, ds18b20};

use super::sysfs_gpio::{self, Direction, SysfsPin};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensors: SensorPaths,
    relays: RelayBank<SysfsPin>,
    comms: CommsLines<SysfsPin, SysfsPin>,
}

impl HardwareAdapter {
    /// Export every line, then set directions.
    ///
    /// Errors keep their phase: [`GpioError::Export`] if a line could not
    /// be exported, [`GpioError::Direction`] if it could not be configured.
    pub fn open(hw: &HardwareConfig, sensors: SensorPaths) -> Result<Self, GpioError> {
        let root = hw.gpio_root.as_str();
        let pins = &hw.pins;

        for pin in pins.all() {
            sysfs_gpio::export(root, pin)?;
        }

        let out = |pin: u8| SysfsPin::open(root, pin, Direction::Out);
        let input = |pin: u8| SysfsPin::open(root, pin, Direction::In);

        let power = match pins.power_source {
            Some(p) => Some(input(p)?),
            None => None,
        };
        let comms = CommsLines::new(
            input(pins.comms_demand_low)?,
            input(pins.comms_demand_high)?,
            power,
            out(pins.comms_handshake_bit0)?,
            out(pins.comms_handshake_bit1)?,
        );

        let [c1, f1, v1, c2, f2, v2] = pins.actuator_pins();
        let relays = RelayBank::new(
            [out(c1)?, out(f1)?, out(v1)?, out(c2)?, out(f2)?, out(v2)?],
            hw.invert_output,
        );

        info!(
            "INFO: GPIO ready (relays {:?}, inverted {})",
            pins.actuator_pins(),
            hw.invert_output
        );
        Ok(Self {
            sensors,
            relays,
            comms,
        })
    }

    /// Point the sensor channels at new files (config reload).
    pub fn set_sensor_paths(&mut self, sensors: SensorPaths) {
        self.sensors = sensors;
    }

    /// Drive every output off, then unexport every line.
    ///
    /// All lines are attempted; the first error is returned.
    pub fn shutdown(mut self) -> Result<(), GpioError> {
        let mut first = self.all_off().err();

        let (low, high, power, bit0, bit1) = self.comms.release();
        let lines = self
            .relays
            .into_pins()
            .into_iter()
            .chain([bit0, bit1, low, high])
            .chain(power);
        for line in lines {
            if let Err(e) = line.unexport() {
                first.get_or_insert(e);
            }
        }
        if let Some(e) = first {
            warn!("WARNING: errors disabling GPIO pins: {e}");
            return Err(e);
        }
        Ok(())
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_temperatures(&mut self) -> RawReadings {
        SensorId::ALL.map(|id| ds18b20::read(self.sensors.path(id)))
    }
}

// ── GpioPort implementation ───────────────────────────────────

impl GpioPort for HardwareAdapter {
    fn read_demand(&mut self) -> Result<DemandLines, GpioError> {
        self.comms.read()
    }

    fn write_actuators(&mut self, mask: ActuatorMask) -> Result<(), GpioError> {
        self.relays.write(mask)
    }

    fn write_handshake(&mut self, response: HandshakeResponse) -> Result<(), GpioError> {
        self.comms.write(response)
    }

    fn all_off(&mut self) -> Result<(), GpioError> {
        let relays = self.relays.all_off();
        let comms = self.comms.write(HandshakeResponse::NoChangeAllowed);
        relays.and(comms)
    }
}
