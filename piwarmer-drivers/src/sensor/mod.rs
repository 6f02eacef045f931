//! Temperature sensor implementations

pub mod max31855;
pub mod mcp3221;
pub mod thermometer;

pub use max31855::{Max31855, Max31855Reading};
pub use mcp3221::Mcp3221Probe;
pub use thermometer::Thermometer;
