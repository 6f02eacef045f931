//! Program instructions
//!
//! A program arrives as a JSON object mapping integer keys to instructions:
//!
//! ```json
//! {
//!   "1": {"mode": "set", "temperature": 80.0, "duration": 300},
//!   "2": {"mode": "linear", "start_temperature": 80.0, "end_temperature": 37.0, "duration": 3600},
//!   "3": {"mode": "repeat", "num_repeats": 2},
//!   "4": {"mode": "hold", "temperature": 37.0}
//! }
//! ```
//!
//! Keys are ordered numerically, so "10" runs after "9".

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;

use super::error::{InvalidProgram, ParseError, ProgramError};

/// A single program instruction
///
/// Durations and counts are kept signed so that nonsense values reach the
/// compiler and are reported as invalid rather than as parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Instruction {
    /// Hold a constant temperature for `duration` seconds
    Set { temperature: f32, duration: i64 },
    /// Ramp from one temperature to another over `duration` seconds
    Linear {
        start_temperature: f32,
        end_temperature: f32,
        duration: i64,
    },
    /// Hold a temperature forever; ends the program
    Hold { temperature: f32 },
    /// Play everything compiled so far `count` more times
    Repeat {
        #[serde(rename = "num_repeats")]
        count: i64,
    },
}

/// Parse program JSON into instructions ordered by numeric key
///
/// Returns `(key, instruction)` pairs so later errors can name the
/// offending entry.
pub fn parse_instructions(json: &str) -> Result<Vec<(u32, Instruction)>, ProgramError> {
    let raw: BTreeMap<String, Instruction> =
        serde_json::from_str(json).map_err(ParseError::from)?;

    let mut indexed = Vec::with_capacity(raw.len());
    for (key, instruction) in raw {
        let index: u32 = key.trim().parse().map_err(|_| ParseError::BadIndex)?;
        indexed.push((index, instruction));
    }

    // BTreeMap orders keys lexically ("10" < "2"); we need numeric order
    indexed.sort_by_key(|(index, _)| *index);

    if let Some(pair) = indexed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(InvalidProgram::DuplicateIndex { index: pair[0].0 }.into());
    }

    Ok(indexed)
}
