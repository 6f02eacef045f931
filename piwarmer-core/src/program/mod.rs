//! Temperature programs
//!
//! Compiles a declarative instruction list into an immutable timeline of
//! temperature segments, and evaluates that timeline against elapsed run
//! time.

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod instruction;
pub mod segment;

pub use compiler::{compile, Program, LINEAR_STEP_S, MAX_SEGMENTS};
pub use error::{InvalidProgram, ParseError, ProgramError};
pub use evaluator::{
    current_step, desired_temperature, minutes_left, seconds_left, upcoming_steps,
    DesiredTemperature, UpcomingStep, RUNNING_NOW,
};
pub use instruction::{parse_instructions, Instruction};
pub use segment::{format_hhmmss, Label, Segment, SegmentRule, MAX_LABEL_LEN};
