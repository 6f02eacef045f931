//! PI controller
//!
//! Maps temperature error to a heater duty cycle in percent. There is no
//! derivative term.
//!
//! The output is normalised by the set point's distance from room
//! temperature, so the same gains work for a 40 °C hold and a 95 °C
//! denaturation step. The integral is clamped to half that distance
//! (anti-windup), and the bounds follow the set point as it moves, while the
//! accumulated error itself carries over so a ramp does not kick the output.

use core::fmt;

use crate::config::PidConfig;

/// Largest duty cycle the controller will ask for (%)
pub const MAX_DUTY_CYCLE: f32 = 100.0;

/// Rejected controller input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidError {
    /// Set point or reading is NaN or infinite
    InvalidInput,
}

impl fmt::Display for PidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidError::InvalidInput => f.write_str("temperature is not a finite number"),
        }
    }
}

/// Snapshot of controller state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidState {
    pub set_point: f32,
    pub accumulated_error: f32,
    pub accumulated_error_min: f32,
    pub accumulated_error_max: f32,
    pub kp: f32,
    pub ki: f32,
}

/// Contribution of each term to the last output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidTerms {
    /// `kp * error`
    pub proportional: f32,
    /// `ki * accumulated_error`
    pub integral: f32,
    /// Clamped output (%)
    pub duty_cycle: f32,
}

/// Proportional-integral controller
///
/// Created fresh for every run. Feed it a set point with
/// [`update_set_point`](Self::update_set_point), then a reading with
/// [`update`](Self::update), once per control cycle.
///
/// Moving the set point also clamps the accumulated error into the new
/// bounds, so the integral never exceeds half the current headroom even
/// when a step drops the target sharply.
#[derive(Debug, Clone)]
pub struct PiController {
    config: PidConfig,
    state: PidState,
    terms: PidTerms,
}

impl PiController {
    /// Create a controller targeting room temperature
    pub fn new(config: PidConfig) -> Self {
        let mut controller = Self {
            config,
            state: PidState {
                set_point: config.room_temperature,
                accumulated_error: 0.0,
                accumulated_error_min: 0.0,
                accumulated_error_max: 0.0,
                kp: config.kp,
                ki: config.ki,
            },
            terms: PidTerms::default(),
        };
        controller.recompute_bounds();
        controller
    }

    /// Change the target temperature
    ///
    /// The accumulated error is kept, only clamped into the new bounds.
    pub fn update_set_point(&mut self, temperature: f32) -> Result<(), PidError> {
        if !temperature.is_finite() {
            return Err(PidError::InvalidInput);
        }
        self.state.set_point = temperature;
        self.recompute_bounds();
        self.state.accumulated_error = self
            .state
            .accumulated_error
            .clamp(self.state.accumulated_error_min, self.state.accumulated_error_max);
        Ok(())
    }

    /// Advance one cycle with the latest reading and return the duty cycle
    ///
    /// The result is always within `0..=MAX_DUTY_CYCLE`.
    pub fn update(&mut self, current_temperature: f32) -> Result<f32, PidError> {
        if !current_temperature.is_finite() {
            return Err(PidError::InvalidInput);
        }

        let state = &mut self.state;
        let error = state.set_point - current_temperature;
        state.accumulated_error = (state.accumulated_error + error)
            .clamp(state.accumulated_error_min, state.accumulated_error_max);

        let proportional = state.kp * error;
        let integral = state.ki * state.accumulated_error;

        let headroom = self.headroom();
        let duty_cycle = if headroom > 0.0 {
            let raw = MAX_DUTY_CYCLE * (proportional + integral) / headroom;
            // NaN (from absurd gains) falls through to zero
            if raw > 0.0 {
                raw.min(MAX_DUTY_CYCLE)
            } else {
                0.0
            }
        } else {
            // Set point at or below room temperature: nothing to heat towards
            0.0
        };

        self.terms = PidTerms {
            proportional,
            integral,
            duty_cycle,
        };
        Ok(duty_cycle)
    }

    /// Current controller state
    pub fn state(&self) -> PidState {
        self.state
    }

    /// Terms behind the last [`update`](Self::update)
    pub fn terms(&self) -> PidTerms {
        self.terms
    }

    fn headroom(&self) -> f32 {
        self.state.set_point - self.config.room_temperature + self.config.margin
    }

    fn recompute_bounds(&mut self) {
        let half = self.headroom() / 2.0;
        if half > 0.0 {
            self.state.accumulated_error_min = -half;
            self.state.accumulated_error_max = half;
        } else {
            self.state.accumulated_error_min = 0.0;
            self.state.accumulated_error_max = 0.0;
        }
    }
}
