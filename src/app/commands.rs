//! Inbound commands to the control service.
//!
//! Raised by the binary in response to signals and handed to
//! [`ControlService::handle_command`](super::service::ControlService::handle_command)
//! between cycles.

use crate::config::SystemConfig;

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Hot-reload configuration (SIGUSR1).
    UpdateConfig(SystemConfig),

    /// Persist run-cycle counters now (shutdown).
    FlushCounters,
}
