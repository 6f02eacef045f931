//! Configuration loading and parsing
//!
//! Loads the daemon configuration from a TOML file, or from the embedded
//! defaults when no file is installed.

pub mod loader;
pub mod types;

pub use loader::{config_path, load};
pub use types::{Backend, DaemonConfig, SimulationConfig};
