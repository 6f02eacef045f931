//! Configuration types
//!
//! Board-agnostic configuration structures. The daemon fills these from
//! its TOML file; every field has a default matching the legacy tuning.

pub mod types;

pub use types::*;
