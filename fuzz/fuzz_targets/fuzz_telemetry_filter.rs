//! Fuzz target: `TelemetryFilter::apply`
//!
//! Each 13-byte chunk is one cycle: a little-endian presence bitmap for
//! the eleven channels followed by one signed byte per channel (whole
//! degrees).
//!
//! Invariants checked:
//! - No panics
//! - Every value is either unknown or within one clamp step of the
//!   range of readings ever fed in
//! - A fault is reported only when a channel is past the failure limit
//!
//! cargo fuzz run fuzz_telemetry_filter

#![no_main]

use hpm::config::ControlConfig;
use hpm::sensors::{RawReadings, SensorId, TelemetryFilter, UNKNOWN_TEMP};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cfg = ControlConfig::default();
    let mut filter = TelemetryFilter::new(&cfg);
    let lo = f32::from(i8::MIN) - cfg.max_temp_diff;
    let hi = f32::from(i8::MAX) + cfg.max_temp_diff;

    for chunk in data.chunks_exact(2 + SensorId::COUNT) {
        let present = u16::from_le_bytes([chunk[0], chunk[1]]);
        let mut raw: RawReadings = [None; SensorId::COUNT];
        for (i, slot) in raw.iter_mut().enumerate() {
            if present & (1 << i) != 0 {
                *slot = Some(f32::from(chunk[2 + i] as i8));
            }
        }

        if let Err(fault) = filter.apply(&raw) {
            assert!(fault.failures > cfg.sensor_failure_limit);
            assert_eq!(filter.channel(fault.channel).failures, fault.failures);
            return;
        }
        for id in SensorId::ALL {
            let v = filter.value(id);
            assert!(v == UNKNOWN_TEMP || (lo..=hi).contains(&v), "{id} drifted to {v}");
        }
    }
});
