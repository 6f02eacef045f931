//! Believability filter
//!
//! Thermocouple amplifiers sometimes return NaN, or a wildly negative
//! value, for a few milliseconds at a time. [`Thermometer`] wraps a probe
//! and keeps reading until it gets a number that could be real.

use embedded_hal::delay::DelayNs;
use piwarmer_core::config::SensorConfig;
use piwarmer_core::traits::{SensorError, TemperatureSensor};

/// Filtered temperature sensor
///
/// A reading is believable when it is finite and at or above
/// `min_believable_temperature`. Probe errors count as rejected reads too,
/// so a loose connector is retried like a glitch. After
/// `max_read_attempts` rejected reads the caller gets
/// [`SensorError::Timeout`]; with a limit of zero it retries forever.
pub struct Thermometer<S, D> {
    probe: S,
    delay: D,
    config: SensorConfig,
    /// Rejected reads since creation
    rejected: u32,
    /// Most recent rejection, for diagnostics
    last_rejection: Option<SensorError>,
}

impl<S: TemperatureSensor, D: DelayNs> Thermometer<S, D> {
    /// Create a new filter around `probe`
    pub fn new(probe: S, delay: D, config: SensorConfig) -> Self {
        Self {
            probe,
            delay,
            config,
            rejected: 0,
            last_rejection: None,
        }
    }

    /// Rejected reads since creation
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Why the most recent read was rejected
    pub fn last_rejection(&self) -> Option<SensorError> {
        self.last_rejection
    }

    /// Access the wrapped probe
    pub fn probe_mut(&mut self) -> &mut S {
        &mut self.probe
    }

    fn believable(&self, temperature: f32) -> bool {
        // NaN compares false, so it is rejected here too
        temperature >= self.config.min_believable_temperature && temperature.is_finite()
    }
}

impl<S: TemperatureSensor, D: DelayNs> TemperatureSensor for Thermometer<S, D> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        let mut attempts: u32 = 0;
        loop {
            let rejection = match self.probe.read_temperature() {
                Ok(t) if self.believable(t) => return Ok(t),
                Ok(_) => SensorError::Implausible,
                Err(e) => e,
            };

            self.rejected = self.rejected.saturating_add(1);
            self.last_rejection = Some(rejection);
            attempts = attempts.saturating_add(1);

            if self.config.max_read_attempts != 0 && attempts >= self.config.max_read_attempts {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_ms(self.config.retry_delay_ms);
        }
    }
}
