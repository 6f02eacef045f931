//! Daemon configuration types
//!
//! Controller tuning comes from piwarmer-core; this adds what only the host
//! process cares about: which hardware to drive and where to keep files.

use std::path::PathBuf;

use piwarmer_core::config::{ControlConfig, PidConfig, SensorConfig};
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Complete daemon configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub control: ControlConfig,
    pub pid: PidConfig,
    pub sensor: SensorConfig,
    pub hardware: HardwareConfig,
    pub simulation: SimulationConfig,
    pub paths: PathsConfig,
}

impl DaemonConfig {
    /// Reject values the control loop cannot work with
    pub fn validate(&self) -> Result<(), DaemonError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), DaemonError> {
            Err(DaemonError::ConfigValue {
                field,
                reason: reason.into(),
            })
        };

        if self.control.poll_interval_ms == 0 {
            return invalid("control.poll_interval_ms", "must be positive");
        }
        if !(self.control.output_scale.is_finite() && self.control.output_scale >= 0.0) {
            return invalid("control.output_scale", "must be a non-negative number");
        }
        if !self.control.max_temperature.is_finite() {
            return invalid("control.max_temperature", "must be a number");
        }
        for (field, value) in [
            ("pid.kp", self.pid.kp),
            ("pid.ki", self.pid.ki),
            ("pid.room_temperature", self.pid.room_temperature),
            ("pid.margin", self.pid.margin),
            (
                "sensor.min_believable_temperature",
                self.sensor.min_believable_temperature,
            ),
        ] {
            if !value.is_finite() {
                return invalid(field, "must be a number");
            }
        }
        if self.hardware.pwm_channel > 1 {
            return invalid("hardware.pwm_channel", "must be 0 or 1");
        }
        if !(self.hardware.pwm_frequency_hz > 0.0) {
            return invalid("hardware.pwm_frequency_hz", "must be positive");
        }
        if !(self.simulation.heat_capacity > 0.0) {
            return invalid("simulation.heat_capacity", "must be positive");
        }
        Ok(())
    }
}

/// Which hardware to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process thermal model
    #[default]
    Simulated,
    /// Raspberry Pi peripherals
    Rpi,
}

/// Which temperature probe is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// MAX31855 thermocouple amplifier on SPI
    #[default]
    Max31855,
    /// MCP3221 analog probe on I²C
    Mcp3221,
}

/// Pin and bus assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareConfig {
    pub backend: Backend,
    pub probe: ProbeKind,
    /// BCM number of the motor driver's enable input
    pub enable_pin: u8,
    /// Driver stage enabled when the pin is LOW
    pub enable_inverted: bool,
    /// Hardware PWM channel (0 or 1)
    pub pwm_channel: u8,
    pub pwm_frequency_hz: f64,
    pub spi_bus: u8,
    pub spi_slave_select: u8,
    pub spi_clock_hz: u32,
    pub i2c_address: u16,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Simulated,
            probe: ProbeKind::Max31855,
            enable_pin: 17,
            enable_inverted: false,
            pwm_channel: 0,
            pwm_frequency_hz: 100.0,
            spi_bus: 0,
            spi_slave_select: 0,
            spi_clock_hz: 1_000_000,
            i2c_address: 0x4D,
        }
    }
}

/// Thermal model for the simulated backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Temperature at start-up (°C)
    pub initial_temperature: f32,
    /// Temperature heat is lost towards (°C)
    pub ambient_temperature: f32,
    /// J/°C
    pub heat_capacity: f32,
    /// W at 100 % duty
    pub heater_power: f32,
    /// W/°C
    pub loss_coefficient: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 22.0,
            ambient_temperature: 22.0,
            heat_capacity: 300.0,
            heater_power: 40.0,
            loss_coefficient: 0.5,
        }
    }
}

/// Where files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Persisted run state shared with the front end
    pub state_dir: PathBuf,
    /// Per-run telemetry logs
    pub telemetry_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("/var/lib/piwarmer"),
            telemetry_dir: PathBuf::from("/var/log/piwarmer"),
        }
    }
}
