//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in piwarmer-core, written against `embedded-hal` 1.0 so they run on a
//! Raspberry Pi (through `rppal`) or a microcontroller HAL alike:
//!
//! - Heater output (enable line plus PWM)
//! - Temperature probes (MAX31855 thermocouple amplifier, MCP3221 I²C probe)
//! - Believability filter wrapping any probe

#![no_std]
#![deny(unsafe_code)]

pub mod heater;
pub mod sensor;
