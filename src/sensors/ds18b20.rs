//! DS18B20 1-Wire temperature probe, read through the kernel `w1_therm`
//! driver.
//!
//! The driver exposes one `w1_slave` file per probe:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The reading counts only when the CRC line ends in `YES`.  `t=` is in
//! millidegrees Celsius.

use std::fs;
use std::path::Path;

use log::debug;

/// Power-on-reset register value; the probe has not converted yet.
const POWER_ON_RESET_MILLI: i32 = 85_000;

/// Parse the contents of a `w1_slave` file.
pub fn parse(text: &str) -> Option<f32> {
    let mut lines = text.lines();
    let crc = lines.next()?;
    if !crc.trim_end().ends_with("YES") {
        return None;
    }
    let data = lines.next()?;
    let (_, raw) = data.rsplit_once("t=")?;
    let milli: i32 = raw.trim().parse().ok()?;
    if milli == POWER_ON_RESET_MILLI {
        return None;
    }
    Some(milli as f32 / 1000.0)
}

/// Read and parse one probe.  Any failure reads as `None`.
pub fn read(path: impl AsRef<Path>) -> Option<f32> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => {
            let v = parse(&text);
            if v.is_none() {
                debug!("ds18b20: unusable reading in {}", path.display());
            }
            v
        }
        Err(e) => {
            debug!("ds18b20: cannot read {}: {e}", path.display());
            None
        }
    }
}
