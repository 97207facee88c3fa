//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `hardware`     | SensorPort         | 1-Wire `w1_slave` files     |
//! |                | GpioPort           | sysfs GPIO (relays, comms)  |
//! | `config_file`  | ConfigPort         | TOML file                   |
//! | `counters`     | CounterStore       | JSON file                   |
//! | `log_sink`     | EventSink          | `log` facade                |
//! | `snapshot`     | EventSink          | JSON telemetry file         |
//! | `time`         | Clock              | system wall clock           |
//!
//! `sysfs_gpio` provides the `embedded-hal` pins the hardware adapter is
//! built from; `logger` is the stderr backend for `log`.

pub mod config_file;
pub mod counters;
pub mod hardware;
pub mod log_sink;
pub mod logger;
pub mod snapshot;
pub mod sysfs_gpio;
pub mod time;
