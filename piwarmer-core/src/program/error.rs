//! Program compilation errors

use core::fmt;

/// The program text could not be read as a list of instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Not valid JSON
    Syntax { line: usize, column: usize },
    /// Valid JSON but not an instruction map (unknown mode, missing or
    /// mistyped field)
    Data { line: usize, column: usize },
    /// Input ended in the middle of a value
    Eof,
    /// An instruction key is not a non-negative integer
    BadIndex,
}

/// The instructions parsed but do not describe a runnable program
///
/// `index` is the instruction's key in the program map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidProgram {
    /// No instructions at all
    Empty,
    /// Two keys name the same index (e.g. "1" and "01")
    DuplicateIndex { index: u32 },
    /// Temperature is NaN or infinite
    NonFiniteTemperature { index: u32 },
    /// Set or Linear duration is zero, negative or too large
    BadDuration { index: u32 },
    /// Linear duration is not a multiple of the ramp step
    RampNotStepAligned { index: u32 },
    /// Repeat count is zero or negative
    BadRepeatCount { index: u32 },
    /// Repeat with no steps before it
    NothingToRepeat { index: u32 },
    /// Any instruction following a Hold
    InstructionAfterHold { index: u32 },
    /// Program expands to more segments than we are willing to hold
    TooManySegments,
    /// Program runs longer than the time base can express
    TooLong,
}

/// Errors produced while turning program text into a [`Program`]
///
/// [`Program`]: super::Program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgramError {
    Parse(ParseError),
    Invalid(InvalidProgram),
}

impl From<ParseError> for ProgramError {
    fn from(e: ParseError) -> Self {
        ProgramError::Parse(e)
    }
}

impl From<InvalidProgram> for ProgramError {
    fn from(e: InvalidProgram) -> Self {
        ProgramError::Invalid(e)
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let (line, column) = (e.line(), e.column());
        match e.classify() {
            Category::Eof => ParseError::Eof,
            Category::Data => ParseError::Data { line, column },
            Category::Syntax | Category::Io => ParseError::Syntax { line, column },
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { line, column } => {
                write!(f, "malformed JSON at line {line}, column {column}")
            }
            ParseError::Data { line, column } => {
                write!(f, "not a valid instruction at line {line}, column {column}")
            }
            ParseError::Eof => f.write_str("program text ends unexpectedly"),
            ParseError::BadIndex => f.write_str("instruction keys must be integers"),
        }
    }
}

impl fmt::Display for InvalidProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidProgram::Empty => f.write_str("program has no instructions"),
            InvalidProgram::DuplicateIndex { index } => {
                write!(f, "instruction {index} appears more than once")
            }
            InvalidProgram::NonFiniteTemperature { index } => {
                write!(f, "instruction {index}: temperature is not a finite number")
            }
            InvalidProgram::BadDuration { index } => {
                write!(f, "instruction {index}: duration must be a positive number of seconds")
            }
            InvalidProgram::RampNotStepAligned { index } => write!(
                f,
                "instruction {index}: linear duration must be a multiple of {} seconds",
                super::LINEAR_STEP_S
            ),
            InvalidProgram::BadRepeatCount { index } => {
                write!(f, "instruction {index}: num_repeats must be positive")
            }
            InvalidProgram::NothingToRepeat { index } => {
                write!(f, "instruction {index}: repeat has no steps before it")
            }
            InvalidProgram::InstructionAfterHold { index } => {
                write!(f, "instruction {index} follows a hold, which never ends")
            }
            InvalidProgram::TooManySegments => write!(
                f,
                "program expands to more than {} steps",
                super::MAX_SEGMENTS
            ),
            InvalidProgram::TooLong => f.write_str("program is too long"),
        }
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Parse(e) => write!(f, "cannot parse program: {e}"),
            ProgramError::Invalid(e) => write!(f, "invalid program: {e}"),
        }
    }
}
