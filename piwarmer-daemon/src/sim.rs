//! Simulated heater and probe
//!
//! A first-order thermal model (heat in from the heater, loss proportional
//! to the difference from ambient) shared between a [`SimulatedHeater`] and
//! a [`SimulatedProbe`]. The plant integrates over real elapsed time, so the
//! daemon behaves the same on a laptop as on the bench, just without the
//! hardware.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;
use piwarmer_core::pid::MAX_DUTY_CYCLE;
use piwarmer_core::traits::{ActuatorError, HeaterOutput, SensorError, TemperatureSensor};

use crate::config::SimulationConfig;

/// Largest integration step; longer gaps are split
const MAX_STEP: Duration = Duration::from_millis(100);

/// Lumped thermal mass heated by a resistor
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalModel {
    temperature: f32,
    config: SimulationConfig,
}

impl ThermalModel {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            temperature: config.initial_temperature,
            config,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Integrate `dt` seconds with the heater at `power_fraction` (0..=1)
    pub fn update(&mut self, power_fraction: f32, dt: f32) {
        let heat_in = self.config.heater_power * power_fraction * dt;
        let heat_out =
            self.config.loss_coefficient * (self.temperature - self.config.ambient_temperature) * dt;
        self.temperature += (heat_in - heat_out) / self.config.heat_capacity;
    }
}

/// Model plus the heater's drive state
#[derive(Debug)]
struct Plant {
    model: ThermalModel,
    enabled: bool,
    duty_cycle: f32,
    last_update: Instant,
}

impl Plant {
    fn power_fraction(&self) -> f32 {
        if self.enabled {
            self.duty_cycle / MAX_DUTY_CYCLE
        } else {
            0.0
        }
    }

    fn advance_by(&mut self, mut elapsed: Duration) {
        let power = self.power_fraction();
        while !elapsed.is_zero() {
            let dt = elapsed.min(MAX_STEP);
            self.model.update(power, dt.as_secs_f32());
            elapsed -= dt;
        }
    }

    /// Catch the model up to the present
    fn sync(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_update);
        self.last_update = now;
        self.advance_by(elapsed);
    }
}

/// Handle shared by the simulated heater and probe
#[derive(Debug, Clone)]
pub struct SimulatedPlant(Rc<RefCell<Plant>>);

impl SimulatedPlant {
    pub fn new(config: SimulationConfig) -> Self {
        Self(Rc::new(RefCell::new(Plant {
            model: ThermalModel::new(config),
            enabled: false,
            duty_cycle: 0.0,
            last_update: Instant::now(),
        })))
    }

    /// Current model temperature, without advancing it
    pub fn temperature(&self) -> f32 {
        self.0.borrow().model.temperature()
    }

    /// Run the model forward by `elapsed` at the current drive
    #[cfg(test)]
    pub fn advance_by(&self, elapsed: Duration) {
        self.0.borrow_mut().advance_by(elapsed);
    }

    pub fn heater(&self) -> SimulatedHeater {
        SimulatedHeater(self.clone())
    }

    pub fn probe(&self) -> SimulatedProbe {
        SimulatedProbe(self.clone())
    }
}

/// Heater feeding the simulated plant
#[derive(Debug, Clone)]
pub struct SimulatedHeater(SimulatedPlant);

impl HeaterOutput for SimulatedHeater {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        let mut plant = self.0 .0.borrow_mut();
        plant.sync();
        plant.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        let mut plant = self.0 .0.borrow_mut();
        plant.sync();
        plant.enabled = false;
        Ok(())
    }

    fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError> {
        if !(0.0..=MAX_DUTY_CYCLE).contains(&percent) {
            return Err(ActuatorError::InvalidDutyCycle);
        }
        let mut plant = self.0 .0.borrow_mut();
        plant.sync();
        plant.duty_cycle = percent;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.0 .0.borrow().enabled
    }
}

/// Probe reading the simulated plant
#[derive(Debug, Clone)]
pub struct SimulatedProbe(SimulatedPlant);

impl TemperatureSensor for SimulatedProbe {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        let mut plant = self.0 .0.borrow_mut();
        plant.sync();
        let temperature = plant.model.temperature();
        debug!("Simulated plant at {temperature:.2} °C");
        Ok(temperature)
    }
}
