//! JSON snapshot of the latest telemetry.
//!
//! Each [`AppEvent::Telemetry`] overwrites one small JSON file that
//! external collectors (collectd exec plugin, an MQTT bridge) poll.  The
//! write goes through a temp file and a rename so readers never see a
//! partial document.  Other events are ignored.

use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::EventSink;

pub struct JsonSnapshotSink {
    path: PathBuf,
    failed: bool,
}

impl JsonSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failed: false,
        }
    }

    fn write(&self, data: &TelemetryData) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(data)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

impl EventSink for JsonSnapshotSink {
    fn emit(&mut self, event: &AppEvent) {
        let AppEvent::Telemetry(data) = event else {
            return;
        };
        match self.write(data) {
            Ok(()) => self.failed = false,
            // Warn once per outage, not every cycle.
            Err(e) if !self.failed => {
                warn!("WARNING: snapshot {} not written: {e}", self.path.display());
                self.failed = true;
            }
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::ActuatorMask;
    use crate::app::state::RunCounters;
    use crate::control::demand::{DemandSignal, PowerSource};
    use crate::control::handshake::HandshakeResponse;
    use crate::fsm::CircuitMode;
    use crate::sensors::{SensorId, Temperatures};

    #[test]
    fn telemetry_lands_as_json() {
        let dir = std::env::temp_dir().join(format!("hpm-snap-{}", std::process::id()));
        let path = dir.join("snapshot.json");
        let mut sink = JsonSnapshotSink::new(&path);

        let mut temperatures = Temperatures::default();
        temperatures.set(SensorId::WaterOut, 41.5);
        let data = TelemetryData {
            cycle: 7,
            temperatures,
            actuators: ActuatorMask::from_bits(0b111),
            modes: [CircuitMode::Cooling, CircuitMode::Off],
            demand: DemandSignal::Low,
            power: PowerSource::Grid,
            handshake: HandshakeResponse::CanAdd,
            counters: RunCounters { ac1: 3, ac2: 0 },
        };
        sink.emit(&AppEvent::ConfigReloaded);
        assert!(!path.exists(), "only telemetry is written");

        sink.emit(&AppEvent::Telemetry(data));
        let v: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(v["cycle"], 7);
        assert_eq!(v["actuators"], 7);
        assert_eq!(v["counters"]["ac1"], 3);
        assert_eq!(v["temperatures"][SensorId::WaterOut.index()], 41.5);
        let _ = fs::remove_dir_all(&dir);
    }
}
