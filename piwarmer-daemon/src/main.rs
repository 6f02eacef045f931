//! piwarmer - programmable heater controller
//!
//! Runs the heater control loop: waits for a front end to store a program
//! and set `active`, then drives the heater through the program until it
//! finishes or is stopped.
//!
//! Usage: `piwarmer [CONFIG]`. Logging follows `RUST_LOG` (default `info`).

use std::convert::Infallible;
use std::process::ExitCode;

use env_logger::Env;
use log::{error, info};
use piwarmer_core::traits::{HeaterOutput, TemperatureSensor};

use crate::clock::SystemClock;
use crate::config::DaemonConfig;
use crate::controller::Controller;
use crate::error::DaemonError;
use crate::store::FileStore;
use crate::telemetry::FileTelemetry;

mod boards;
mod clock;
mod config;
mod controller;
mod error;
mod sim;
mod store;
mod telemetry;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(never) => match never {},
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<Infallible, DaemonError> {
    info!("piwarmer {} starting", env!("CARGO_PKG_VERSION"));
    let path = config::config_path(std::env::args().nth(1));
    let config = config::load(&path)?;
    boards::start(&config)
}

/// Run the control loop on a backend's sensor and heater
pub(crate) fn serve<S, H>(sensor: S, heater: H, config: &DaemonConfig) -> Result<Infallible, DaemonError>
where
    S: TemperatureSensor,
    H: HeaterOutput,
{
    let store = FileStore::open(&config.paths.state_dir)?;
    info!("State store: {}", store.root().display());
    let telemetry = FileTelemetry::new(&config.paths.telemetry_dir);

    let mut controller = Controller::new(
        sensor,
        heater,
        store,
        telemetry,
        SystemClock::new(),
        config.control,
        config.pid,
    );
    controller.run()
}
