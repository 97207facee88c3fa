//! Relay bank for the six actuator outputs.
//!
//! Pin order matches [`ActuatorMask`] bit order: AC1 compressor, fan,
//! valve, then AC2.  With `invert` set the relay board is active-low, so
//! ON drives the line LOW.
//!
//! ## Safety contract
//!
//! The bank writes whatever mask it is handed.  Dwell times, stagger and
//! valve ordering are enforced by the interlocks before a mask gets here.

use embedded_hal::digital::{OutputPin, PinState};

use crate::actuators::ActuatorMask;

pub struct RelayBank<P> {
    pins: [P; 6],
    invert: bool,
    state: ActuatorMask,
}

impl<P: OutputPin> RelayBank<P> {
    /// Wrap six output pins.  Nothing is driven until the first write.
    pub fn new(pins: [P; 6], invert: bool) -> Self {
        Self {
            pins,
            invert,
            state: ActuatorMask::NONE,
        }
    }

    pub fn write(&mut self, mask: ActuatorMask) -> Result<(), P::Error> {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            let on = mask.bits() & (1 << bit) != 0;
            pin.set_state(PinState::from(on != self.invert))?;
        }
        self.state = mask;
        Ok(())
    }

    pub fn all_off(&mut self) -> Result<(), P::Error> {
        self.write(ActuatorMask::NONE)
    }

    /// Mask last written successfully.
    pub fn state(&self) -> ActuatorMask {
        self.state
    }

    pub fn into_pins(self) -> [P; 6] {
        self.pins
    }
}
