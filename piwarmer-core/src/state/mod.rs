//! State machine for the control loop
//!
//! Defines the authoritative runtime behavior of the controller.
//! The state machine is explicit, finite, and deterministic; the daemon
//! performs the side effects of each state and feeds the outcome back in
//! as an [`Event`].

pub mod events;
pub mod machine;
pub mod run;

pub use events::Event;
pub use machine::{FaultKind, State};
pub use run::RunState;
