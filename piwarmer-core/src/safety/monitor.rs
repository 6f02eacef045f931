//! Over-temperature monitor
//!
//! The PI controller already backs off above the set point; this is an
//! independent ceiling that holds even with bad tuning or a bad program.

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Reading at or above the ceiling; the heater must get zero duty
    OverTemperature,
}

/// Safety monitor for over-temperature detection
///
/// Tracks the last status so callers can report only changes.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    /// Ceiling (°C)
    max_temperature: f32,
    /// Status from the last reading
    status: SafetyStatus,
}

impl SafetyMonitor {
    /// Create a new safety monitor
    pub fn new(max_temperature: f32) -> Self {
        Self {
            max_temperature,
            status: SafetyStatus::Ok,
        }
    }

    /// Check a reading against the ceiling and remember the result
    pub fn update_temperature(&mut self, temperature: f32) -> SafetyStatus {
        // NaN never gets here (the thermometer filters it), but treat it as hot
        self.status = if temperature < self.max_temperature {
            SafetyStatus::Ok
        } else {
            SafetyStatus::OverTemperature
        };
        self.status
    }

    /// Apply the cut-off to a requested duty cycle
    pub fn limit_duty_cycle(&self, duty_cycle: f32) -> f32 {
        match self.status {
            SafetyStatus::Ok => duty_cycle,
            SafetyStatus::OverTemperature => 0.0,
        }
    }

    /// Status from the last reading
    pub fn status(&self) -> SafetyStatus {
        self.status
    }

    /// Forget previous readings (new run)
    pub fn reset(&mut self) {
        self.status = SafetyStatus::Ok;
    }

    /// Configured ceiling (°C)
    pub fn max_temperature(&self) -> f32 {
        self.max_temperature
    }
}
