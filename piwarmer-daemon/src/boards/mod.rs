//! Backend wiring
//!
//! Each backend builds a sensor and a heater from the `[hardware]` config
//! and hands them to [`crate::serve`]. Concrete types differ per backend,
//! so the control loop is monomorphised once per arm.

#[cfg(feature = "rpi")]
pub mod rpi;
pub mod simulated;

use std::convert::Infallible;

use crate::config::{Backend, DaemonConfig};
use crate::error::DaemonError;

/// Build the configured backend and run the control loop on it
pub fn start(config: &DaemonConfig) -> Result<Infallible, DaemonError> {
    match config.hardware.backend {
        Backend::Simulated => simulated::start(config),
        #[cfg(feature = "rpi")]
        Backend::Rpi => rpi::start(config),
        #[cfg(not(feature = "rpi"))]
        Backend::Rpi => Err(DaemonError::BackendUnavailable("rpi")),
    }
}
