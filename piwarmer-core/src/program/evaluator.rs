//! Temperature evaluator
//!
//! Pure functions over a compiled [`Program`] and elapsed run time. Nothing
//! here keeps state, so the control loop and any display code can call them
//! freely.

use alloc::vec::Vec;

use serde::Serialize;

use super::compiler::Program;
use super::segment::{format_hhmmss, Label};

/// Countdown text for the step that is currently running
pub const RUNNING_NOW: &str = "Now Running";

/// Result of evaluating a program at some elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesiredTemperature {
    /// Drive the heater towards this temperature (°C)
    Temperature(f32),
    /// Every finite step has run and there is no Hold; the run is over
    ProgramComplete,
}

/// One entry of the upcoming-steps display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingStep {
    /// Segment label
    pub label: Label,
    /// [`RUNNING_NOW`] or `HH:MM:SS` until the step starts
    pub countdown: heapless::String<16>,
}

/// Index of the segment active at `elapsed_s`, if any
///
/// Negative (and NaN) elapsed times are treated as zero.
pub fn current_step(program: &Program, elapsed_s: f64) -> Option<usize> {
    let elapsed_s = elapsed_s.max(0.0);
    let segments = program.segments();

    // Segments are sorted and contiguous: the candidate is the last one
    // starting at or before `elapsed_s`
    let after = segments.partition_point(|s| f64::from(s.start_s) <= elapsed_s);
    let index = after.checked_sub(1)?;
    segments[index].contains(elapsed_s).then_some(index)
}

/// Desired temperature `elapsed_s` seconds into the run
pub fn desired_temperature(program: &Program, elapsed_s: f64) -> DesiredTemperature {
    let elapsed_s = elapsed_s.max(0.0);
    match current_step(program, elapsed_s) {
        Some(index) => {
            let segment = &program.segments()[index];
            let into_s = elapsed_s - f64::from(segment.start_s);
            DesiredTemperature::Temperature(segment.temperature_at(into_s))
        }
        None => DesiredTemperature::ProgramComplete,
    }
}

/// Whole seconds until the finite part of the program ends
///
/// A trailing Hold is not counted; this reaches zero when the Hold begins.
pub fn seconds_left(program: &Program, elapsed_s: f64) -> u32 {
    let left = f64::from(program.total_duration_s()) - elapsed_s.max(0.0);
    // Float-to-int casts saturate, and `left` never exceeds u32::MAX
    left.max(0.0) as u32
}

/// Whole minutes until the finite part of the program ends
pub fn minutes_left(program: &Program, elapsed_s: f64) -> u32 {
    seconds_left(program, elapsed_s) / 60
}

/// The running step and up to `n - 1` steps after it
///
/// Display only: the control loop never reads this back.
pub fn upcoming_steps(program: &Program, elapsed_s: f64, n: usize) -> Vec<UpcomingStep> {
    let elapsed_s = elapsed_s.max(0.0);
    let Some(first) = current_step(program, elapsed_s) else {
        return Vec::new();
    };

    program.segments()[first..]
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, segment)| {
            let countdown = if i == 0 {
                let mut running = heapless::String::new();
                let _ = running.push_str(RUNNING_NOW);
                running
            } else {
                let until_s = (f64::from(segment.start_s) - elapsed_s).max(0.0);
                format_hhmmss(ceil_seconds(until_s))
            };
            UpcomingStep {
                label: segment.label(),
                countdown,
            }
        })
        .collect()
}

/// Round non-negative seconds up to a whole second (core has no `f64::ceil`)
fn ceil_seconds(seconds: f64) -> u32 {
    let whole = seconds as u32;
    if f64::from(whole) < seconds {
        whole.saturating_add(1)
    } else {
        whole
    }
}
