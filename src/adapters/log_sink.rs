//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade (stderr, captured by journald in production).

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::SensorId;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temps: Vec<String> = SensorId::ALL
                    .iter()
                    .map(|&id| format!("{}={:.3}", id.label(), t.temperatures.get(id)))
                    .collect();
                info!(
                    "TELEM | cycle={} | {} | out=[{}] | modes={}/{} | demand={} handshake={} | runs={}/{}",
                    t.cycle,
                    temps.join(" "),
                    t.actuators,
                    t.modes[0],
                    t.modes[1],
                    t.demand,
                    t.handshake,
                    t.counters.ac1,
                    t.counters.ac2,
                );
            }
            AppEvent::ModeChanged { circuit, from, to } => {
                debug!("MODE | {circuit} {from} -> {to}");
            }
            AppEvent::ActuatorsChanged(mask) => {
                info!("INFO: outputs now [{mask}]");
            }
            AppEvent::HandshakeChanged(r) => {
                info!("INFO: handshake {r} (bits {:02b})", r.bits());
            }
            AppEvent::DemandChanged { demand, power } => {
                if power == &crate::control::demand::PowerSource::Battery {
                    warn!("WARNING: peer reports battery power, shedding load (demand {demand})");
                } else {
                    debug!("DEMAND | {demand} on {power:?}");
                }
            }
            AppEvent::FatalFault(fault) => {
                error!("ALARM: {fault}, all outputs off");
            }
            AppEvent::CountersFlushed(c) => {
                debug!("COUNTERS | saved AC1={} AC2={}", c.ac1, c.ac2);
            }
            AppEvent::ConfigReloaded => {
                info!("INFO: new configuration in effect");
            }
            AppEvent::Started([m1, m2]) => {
                info!("START | AC1={m1} AC2={m2}");
            }
        }
    }
}
