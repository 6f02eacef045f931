//! Per-run telemetry stream

use core::fmt;

/// One RUN cycle as written to the telemetry stream
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    /// Reading (°C)
    pub current_temperature: f32,
    /// Set point (°C)
    pub desired_temperature: f32,
    /// Duty cycle sent to the heater (%)
    pub duty_cycle: f32,
}

/// Telemetry failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// The stream could not be created
    Open,
    /// A record could not be written
    Write,
    /// `record` without a `begin_run`
    NotStarted,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TelemetryError::Open => "cannot open telemetry stream",
            TelemetryError::Write => "cannot write telemetry record",
            TelemetryError::NotStarted => "no telemetry stream open",
        })
    }
}

/// Append-only sink with one stream per run
pub trait TelemetrySink {
    /// Open the stream for a run; `run_key` is the run's start timestamp
    fn begin_run(&mut self, run_key: &str) -> Result<(), TelemetryError>;

    /// Append one cycle
    fn record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError>;

    /// Close the current stream, if any
    fn end_run(&mut self);
}
