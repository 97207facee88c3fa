//! Peer comms lines: two demand inputs, an optional power-source input,
//! and two handshake outputs.  A HIGH input is an asserted line.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::control::demand::DemandLines;
use crate::control::handshake::HandshakeResponse;

pub struct CommsLines<I, O> {
    demand_low: I,
    demand_high: I,
    power: Option<I>,
    bit0: O,
    bit1: O,
}

impl<I: InputPin, O: OutputPin> CommsLines<I, O> {
    pub fn new(demand_low: I, demand_high: I, power: Option<I>, bit0: O, bit1: O) -> Self {
        Self {
            demand_low,
            demand_high,
            power,
            bit0,
            bit1,
        }
    }

    pub fn read(&mut self) -> Result<DemandLines, I::Error> {
        let power = match self.power.as_mut() {
            Some(pin) => Some(pin.is_high()?),
            None => None,
        };
        Ok(DemandLines {
            low: self.demand_low.is_high()?,
            high: self.demand_high.is_high()?,
            power,
        })
    }

    pub fn write(&mut self, response: HandshakeResponse) -> Result<(), O::Error> {
        self.bit0.set_state(PinState::from(response.bit0()))?;
        self.bit1.set_state(PinState::from(response.bit1()))
    }

    pub fn release(self) -> (I, I, Option<I>, O, O) {
        (self.demand_low, self.demand_high, self.power, self.bit0, self.bit1)
    }
}
