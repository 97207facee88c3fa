//! Fuzz target: `ds18b20::parse`
//!
//! Feeds arbitrary text as the contents of a `w1_slave` file.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A parsed value is finite and inside the range an `i32` of
//!   millidegrees can express
//! - Anything without a `YES` CRC line never parses
//!
//! cargo fuzz run fuzz_w1_slave

#![no_main]

use hpm::sensors::ds18b20;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let Some(v) = ds18b20::parse(&text) else {
        return;
    };
    assert!(v.is_finite());
    assert!(v.abs() <= i32::MAX as f32 / 1000.0 + 1.0);
    let first = text.lines().next().unwrap_or_default();
    assert!(first.trim_end().ends_with("YES"), "CRC line must say YES");
});
