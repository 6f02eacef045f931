//! Collaborator traits
//!
//! These traits define the interface between the control loop and the
//! hardware and storage it drives.

pub mod heater;
pub mod store;
pub mod telemetry;

pub use heater::{ActuatorError, HeaterOutput, SensorError, TemperatureSensor};
pub use store::{KeyValueStore, Progress, RunStore, StoreError, StoreKey};
pub use telemetry::{TelemetryError, TelemetryRecord, TelemetrySink};
