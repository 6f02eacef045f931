//! Daemon errors
//!
//! The core crates keep small `Copy` error enums; this is where they meet
//! the host's I/O and configuration errors.

use std::io;
use std::path::PathBuf;

use piwarmer_core::pid::PidError;
use piwarmer_core::program::ProgramError;
use piwarmer_core::traits::{ActuatorError, SensorError, StoreError, TelemetryError};
use thiserror::Error;

/// Errors surfaced by the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("cannot read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    ConfigValue { field: &'static str, reason: String },

    #[error("cannot prepare {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },

    #[error("backend `{0}` is not compiled in (enable the `{0}` feature)")]
    BackendUnavailable(&'static str),

    #[cfg(feature = "rpi")]
    #[error("GPIO: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[cfg(feature = "rpi")]
    #[error("PWM: {0}")]
    Pwm(#[from] rppal::pwm::Error),

    #[cfg(feature = "rpi")]
    #[error("SPI: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[cfg(feature = "rpi")]
    #[error("I2C: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("{0}")]
    Program(ProgramError),

    #[error("{0}")]
    Store(StoreError),

    #[error("{0}")]
    Sensor(SensorError),

    #[error("{0}")]
    Actuator(ActuatorError),

    #[error("{0}")]
    Telemetry(TelemetryError),

    #[error("controller rejected input: {0}")]
    Pid(PidError),
}

// The core error enums are no_std and do not implement std::error::Error,
// so these cannot use #[from]
macro_rules! from_core_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for DaemonError {
                fn from(e: $source) -> Self {
                    DaemonError::$variant(e)
                }
            }
        )*
    };
}

from_core_error! {
    ProgramError => Program,
    StoreError => Store,
    SensorError => Sensor,
    ActuatorError => Actuator,
    TelemetryError => Telemetry,
    PidError => Pid,
}
