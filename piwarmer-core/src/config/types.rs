//! Configuration type definitions
//!
//! These types describe controller tuning and loop timing. They deserialize
//! from any self-describing format, falling back to the defaults below for
//! missing fields.

use serde::{Deserialize, Serialize};

/// PI controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain
    pub ki: f32,
    /// Temperature the heater loses heat towards (°C)
    ///
    /// Output is normalised by how far the set point sits above this.
    pub room_temperature: f32,
    /// Headroom added to the set point distance (°C)
    pub margin: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 5.0,
            ki: 1.0,
            room_temperature: 20.0,
            margin: 5.0,
        }
    }
}

/// Control loop timing and output shaping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Interval between LISTEN polls and between RUN cycles (ms)
    pub poll_interval_ms: u32,
    /// Multiplier applied to the controller output before it reaches the heater
    ///
    /// The heater responds slowly; values below 1.0 soften the output.
    pub output_scale: f32,
    /// Readings at or above this force the duty cycle to zero (°C)
    pub max_temperature: f32,
    /// Number of upcoming steps published to the store
    pub upcoming_steps: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            output_scale: 1.0,
            max_temperature: 110.0,
            upcoming_steps: 4,
        }
    }
}

/// Temperature sensor believability filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Readings below this are treated as glitches and re-read (°C)
    ///
    /// The thermocouple amplifier occasionally reports -100 to -200 °C; the
    /// room never gets colder than this.
    pub min_believable_temperature: f32,
    /// Reads attempted before giving up (0 = retry forever)
    pub max_read_attempts: u32,
    /// Pause between rejected reads (ms)
    pub retry_delay_ms: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            min_believable_temperature: 10.0,
            max_read_attempts: 50,
            retry_delay_ms: 20,
        }
    }
}
