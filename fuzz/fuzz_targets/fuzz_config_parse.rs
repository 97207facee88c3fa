//! Fuzz target: `config_file::parse`
//!
//! Arbitrary TOML-ish text must either fail with a typed error or yield a
//! config that passes validation and survives `normalize` unchanged.
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use hpm::adapters::config_file;
use hpm::config::validate_config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = config_file::parse(text) else {
        return;
    };
    assert!(validate_config(&cfg).is_ok());

    let mut again = cfg.clone();
    again.normalize();
    assert_eq!(again, cfg, "normalize must be idempotent");
});
