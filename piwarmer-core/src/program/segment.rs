//! Timeline segments generated from instructions

use core::fmt::{self, Write};

use serde::Serialize;

/// Maximum label length in bytes
pub const MAX_LABEL_LEN: usize = 96;

/// Human-readable description of a segment
pub type Label = heapless::String<MAX_LABEL_LEN>;

/// How a segment decides its temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SegmentRule {
    /// Constant temperature from a `set` instruction
    Set { temperature: f32 },
    /// One constant step of a `linear` ramp
    ///
    /// `step` counts from 1 to `steps`.
    Ramp {
        temperature: f32,
        from: f32,
        to: f32,
        step: u32,
        steps: u32,
    },
    /// Unbounded terminal temperature from a `hold` instruction
    Hold { temperature: f32 },
}

/// A single timeline segment
///
/// Segments are the atomic units of a compiled program: a half-open
/// interval `[start_s, end_s)` of run time with one temperature rule.
/// Only a final Hold has no end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Offset from program start (seconds)
    pub start_s: u32,
    /// End offset (seconds), `None` for a Hold
    pub end_s: Option<u32>,
    /// Temperature rule
    pub rule: SegmentRule,
}

impl Segment {
    /// Segment length in seconds, `None` if unbounded
    pub fn duration_s(&self) -> Option<u32> {
        self.end_s.map(|end| end - self.start_s)
    }

    /// Whether `elapsed_s` falls inside this segment
    pub fn contains(&self, elapsed_s: f64) -> bool {
        let after_start = f64::from(self.start_s) <= elapsed_s;
        match self.end_s {
            Some(end) => after_start && elapsed_s < f64::from(end),
            None => after_start,
        }
    }

    /// Desired temperature `elapsed_into_s` seconds after the segment starts
    ///
    /// Ramps are pre-expanded into constant steps, so every rule is flat
    /// within its own segment.
    pub fn temperature_at(&self, _elapsed_into_s: f64) -> f32 {
        match self.rule {
            SegmentRule::Set { temperature }
            | SegmentRule::Ramp { temperature, .. }
            | SegmentRule::Hold { temperature } => temperature,
        }
    }

    /// Copy of this segment moved `offset_s` seconds later
    pub(crate) fn shifted(&self, offset_s: u32) -> Option<Self> {
        Some(Self {
            start_s: self.start_s.checked_add(offset_s)?,
            end_s: match self.end_s {
                Some(end) => Some(end.checked_add(offset_s)?),
                None => None,
            },
            rule: self.rule,
        })
    }

    /// Display label, e.g. "80.0°C for 00:05:00"
    ///
    /// Temperatures of 100000 °C or more in magnitude are written in
    /// exponent form, so every label fits in [`MAX_LABEL_LEN`].
    pub fn label(&self) -> Label {
        let mut label = Label::new();
        let _ = match self.rule {
            SegmentRule::Set { temperature } => write!(
                label,
                "{}°C for {}",
                Celsius(temperature),
                format_hhmmss(self.duration_s().unwrap_or(0))
            ),
            SegmentRule::Ramp {
                from,
                to,
                step,
                steps,
                ..
            } => write!(
                label,
                "From {}°C to {}°C over {} (step {}/{})",
                Celsius(from),
                Celsius(to),
                format_hhmmss(steps.saturating_mul(self.duration_s().unwrap_or(0))),
                step,
                steps
            ),
            SegmentRule::Hold { temperature } => {
                write!(label, "Hold at {}°C", Celsius(temperature))
            }
        };
        label
    }
}

/// Temperature with one decimal, bounded to eight characters
struct Celsius(f32);

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() < 99_999.95 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{:.1e}", self.0)
        }
    }
}

/// Format seconds as `HH:MM:SS`
///
/// Hours are not wrapped at 24, so long programs stay readable.
pub fn format_hhmmss(seconds: u32) -> heapless::String<16> {
    let mut out = heapless::String::new();
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    );
    out
}
