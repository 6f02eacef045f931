//! Board-agnostic core logic for the heater controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or on the host operating system:
//!
//! - Program compiler and temperature evaluator
//! - PI controller producing heater duty cycles
//! - State machine for the control loop
//! - Safety helpers (best-effort isolation, over-temperature cut-off)
//! - Collaborator traits (sensor, heater, state store, telemetry)
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod pid;
pub mod program;
pub mod safety;
pub mod state;
pub mod traits;
