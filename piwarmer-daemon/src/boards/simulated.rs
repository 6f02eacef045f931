//! Simulated backend

use std::convert::Infallible;

use log::info;
use piwarmer_drivers::sensor::Thermometer;

use crate::clock::StdDelay;
use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::sim::SimulatedPlant;

pub fn start(config: &DaemonConfig) -> Result<Infallible, DaemonError> {
    let plant = SimulatedPlant::new(config.simulation);
    info!(
        "Simulated plant: {:.1} °C, {:.0} W heater",
        plant.temperature(),
        config.simulation.heater_power
    );

    let sensor = Thermometer::new(plant.probe(), StdDelay, config.sensor);
    crate::serve(sensor, plant.heater(), config)
}
