//! Safety helpers
//!
//! Over-temperature cut-off and best-effort action isolation.

pub mod isolation;
pub mod monitor;

pub use isolation::{Isolated, IsolatedFailure, IsolationReport};
pub use monitor::{SafetyMonitor, SafetyStatus};
