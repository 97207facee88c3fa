//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no GPIO or
//! 1-Wire hardware required.

mod control_service_tests;
mod file_adapter_tests;
mod mock_hw;
