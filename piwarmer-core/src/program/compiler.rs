//! Program compiler
//!
//! Walks instructions in key order and grows a contiguous segment list.
//! Compilation is all-or-nothing: either every instruction is applied or
//! an error is returned and nothing escapes.

use alloc::vec::Vec;

use super::error::{InvalidProgram, ProgramError};
use super::instruction::{parse_instructions, Instruction};
use super::segment::{Segment, SegmentRule};

/// Length of one step of a linear ramp (seconds)
///
/// Limits ramps to four temperature changes per minute.
pub const LINEAR_STEP_S: u32 = 15;

/// Upper bound on compiled segments
///
/// A long ramp repeated many times expands quickly; past this the program
/// is rejected rather than exhausting memory.
pub const MAX_SEGMENTS: usize = 100_000;

/// A compiled, immutable temperature program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    segments: Vec<Segment>,
    total_duration_s: u32,
}

impl Program {
    /// Parse and compile program JSON in one go
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        compile(parse_instructions(json)?)
    }

    /// Segments in start order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all finite segment durations (seconds)
    pub fn total_duration_s(&self) -> u32 {
        self.total_duration_s
    }

    /// Whether the program ends in an unbounded Hold
    pub fn has_hold(&self) -> bool {
        self.segments.last().is_some_and(|s| s.end_s.is_none())
    }
}

/// Compile `(key, instruction)` pairs, already in run order
pub fn compile<I>(instructions: I) -> Result<Program, ProgramError>
where
    I: IntoIterator<Item = (u32, Instruction)>,
{
    let mut timeline = Timeline::default();
    let mut count = 0usize;

    for (index, instruction) in instructions {
        count += 1;
        timeline.apply(index, instruction)?;
    }

    if count == 0 {
        return Err(InvalidProgram::Empty.into());
    }

    Ok(Program {
        segments: timeline.segments,
        total_duration_s: timeline.total_duration_s,
    })
}

/// Compilation in progress
#[derive(Default)]
struct Timeline {
    segments: Vec<Segment>,
    total_duration_s: u32,
    sealed: bool,
}

impl Timeline {
    fn apply(&mut self, index: u32, instruction: Instruction) -> Result<(), InvalidProgram> {
        if self.sealed {
            return Err(InvalidProgram::InstructionAfterHold { index });
        }

        match instruction {
            Instruction::Set {
                temperature,
                duration,
            } => {
                check_temperature(index, temperature)?;
                let duration_s = positive_seconds(index, duration)?;
                self.push(duration_s, SegmentRule::Set { temperature })
            }
            Instruction::Linear {
                start_temperature,
                end_temperature,
                duration,
            } => {
                check_temperature(index, start_temperature)?;
                check_temperature(index, end_temperature)?;
                let duration_s = positive_seconds(index, duration)?;
                if duration_s % LINEAR_STEP_S != 0 {
                    return Err(InvalidProgram::RampNotStepAligned { index });
                }
                self.ramp(start_temperature, end_temperature, duration_s / LINEAR_STEP_S)
            }
            Instruction::Repeat { count } => {
                if count <= 0 {
                    return Err(InvalidProgram::BadRepeatCount { index });
                }
                if self.segments.is_empty() {
                    return Err(InvalidProgram::NothingToRepeat { index });
                }
                self.repeat(count as u64)
            }
            Instruction::Hold { temperature } => {
                check_temperature(index, temperature)?;
                self.reserve(1)?;
                self.segments.push(Segment {
                    start_s: self.total_duration_s,
                    end_s: None,
                    rule: SegmentRule::Hold { temperature },
                });
                self.sealed = true;
                Ok(())
            }
        }
    }

    /// Append one bounded segment at the current end of the timeline
    fn push(&mut self, duration_s: u32, rule: SegmentRule) -> Result<(), InvalidProgram> {
        self.reserve(1)?;
        let start_s = self.total_duration_s;
        let end_s = start_s
            .checked_add(duration_s)
            .ok_or(InvalidProgram::TooLong)?;

        self.segments.push(Segment {
            start_s,
            end_s: Some(end_s),
            rule,
        });
        self.total_duration_s = end_s;
        Ok(())
    }

    /// Expand a ramp into `steps` constant steps
    ///
    /// Step `i` (0-based) holds `from + (to - from) * i / steps`, so the first
    /// step starts exactly at `from` and the last lands one step short of `to`.
    fn ramp(&mut self, from: f32, to: f32, steps: u32) -> Result<(), InvalidProgram> {
        self.reserve(steps as usize)?;
        for i in 0..steps {
            let fraction = i as f32 / steps as f32;
            let temperature = from + (to - from) * fraction;
            self.push(
                LINEAR_STEP_S,
                SegmentRule::Ramp {
                    temperature,
                    from,
                    to,
                    step: i + 1,
                    steps,
                },
            )?;
        }
        Ok(())
    }

    /// Append `count` copies of everything compiled so far
    fn repeat(&mut self, count: u64) -> Result<(), InvalidProgram> {
        let block_len = self.segments.len();
        let copies = usize::try_from(count).map_err(|_| InvalidProgram::TooManySegments)?;
        let added = block_len
            .checked_mul(copies)
            .ok_or(InvalidProgram::TooManySegments)?;
        self.reserve(added)?;

        let block_duration_s = self.total_duration_s;
        for copy in 1..=count {
            let offset_s = u32::try_from(copy)
                .ok()
                .and_then(|copy| block_duration_s.checked_mul(copy))
                .ok_or(InvalidProgram::TooLong)?;
            for i in 0..block_len {
                let shifted = self.segments[i]
                    .shifted(offset_s)
                    .ok_or(InvalidProgram::TooLong)?;
                self.segments.push(shifted);
            }
        }

        // The block is always finite here: a Hold would have sealed the timeline
        self.total_duration_s = self
            .segments
            .last()
            .and_then(|s| s.end_s)
            .ok_or(InvalidProgram::TooLong)?;
        Ok(())
    }

    /// Fail before growing past [`MAX_SEGMENTS`]
    fn reserve(&mut self, additional: usize) -> Result<(), InvalidProgram> {
        match self.segments.len().checked_add(additional) {
            Some(total) if total <= MAX_SEGMENTS => {
                self.segments.reserve(additional);
                Ok(())
            }
            _ => Err(InvalidProgram::TooManySegments),
        }
    }
}

fn check_temperature(index: u32, temperature: f32) -> Result<(), InvalidProgram> {
    if temperature.is_finite() {
        Ok(())
    } else {
        Err(InvalidProgram::NonFiniteTemperature { index })
    }
}

fn positive_seconds(index: u32, duration: i64) -> Result<u32, InvalidProgram> {
    match u32::try_from(duration) {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(InvalidProgram::BadDuration { index }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{desired_temperature, DesiredTemperature};
    use proptest::prelude::*;

    fn set(temperature: f32, duration: i64) -> Instruction {
        Instruction::Set {
            temperature,
            duration,
        }
    }

    fn numbered(instructions: &[Instruction]) -> Vec<(u32, Instruction)> {
        instructions
            .iter()
            .enumerate()
            .map(|(i, instruction)| (i as u32 + 1, *instruction))
            .collect()
    }

    fn assert_contiguous(program: &Program) {
        let segments = program.segments();
        assert_eq!(segments[0].start_s, 0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_s, Some(pair[1].start_s));
        }
        for segment in &segments[..segments.len() - 1] {
            assert!(segment.end_s.is_some());
        }
    }

    fn finite_sum(program: &Program) -> u64 {
        program
            .segments()
            .iter()
            .filter_map(|s| s.duration_s())
            .map(u64::from)
            .sum()
    }

    #[test]
    fn test_set_then_hold_example() {
        let json = r#"{"1":{"mode":"set","temperature":80,"duration":300},"2":{"mode":"hold","temperature":37}}"#;
        let program = Program::from_json(json).unwrap();

        assert_eq!(program.total_duration_s(), 300);
        assert_eq!(program.segments().len(), 2);
        assert!(program.has_hold());
        assert_contiguous(&program);
    }

    #[test]
    fn test_set_rejects_non_positive_duration() {
        assert_eq!(
            compile(numbered(&[set(50.0, 0)])),
            Err(InvalidProgram::BadDuration { index: 1 }.into())
        );
        assert_eq!(
            compile(numbered(&[set(50.0, 10), set(50.0, -10)])),
            Err(InvalidProgram::BadDuration { index: 2 }.into())
        );
    }

    #[test]
    fn test_linear_expands_into_steps() {
        let program = compile(numbered(&[Instruction::Linear {
            start_temperature: 80.0,
            end_temperature: 37.0,
            duration: 60,
        }]))
        .unwrap();

        assert_eq!(program.segments().len(), 4);
        assert_eq!(program.total_duration_s(), 60);
        assert_contiguous(&program);

        let temps: Vec<f32> = program
            .segments()
            .iter()
            .map(|s| s.temperature_at(0.0))
            .collect();
        assert_eq!(temps[0], 80.0);
        assert!((temps[1] - 69.25).abs() < 1e-4);
        assert!((temps[3] - 47.75).abs() < 1e-4);
    }

    #[test]
    fn test_linear_rejects_misaligned_duration() {
        let linear = |duration| Instruction::Linear {
            start_temperature: 20.0,
            end_temperature: 40.0,
            duration,
        };
        assert_eq!(
            compile(numbered(&[linear(20)])),
            Err(InvalidProgram::RampNotStepAligned { index: 1 }.into())
        );
        assert_eq!(
            compile(numbered(&[linear(0)])),
            Err(InvalidProgram::BadDuration { index: 1 }.into())
        );
    }

    #[test]
    fn test_repeat_duplicates_compiled_block() {
        let program = compile(numbered(&[
            set(95.0, 30),
            set(55.0, 30),
            Instruction::Repeat { count: 2 },
            set(72.0, 60),
        ]))
        .unwrap();

        // Block of two played three times, then the trailing set
        assert_eq!(program.segments().len(), 7);
        assert_eq!(program.total_duration_s(), 240);
        assert_contiguous(&program);
        assert_eq!(program.segments()[4].start_s, 120);
        assert_eq!(program.segments()[6].start_s, 180);
    }

    #[test]
    fn test_repeat_errors() {
        assert_eq!(
            compile(numbered(&[Instruction::Repeat { count: 3 }])),
            Err(InvalidProgram::NothingToRepeat { index: 1 }.into())
        );
        assert_eq!(
            compile(numbered(&[set(20.0, 10), Instruction::Repeat { count: 0 }])),
            Err(InvalidProgram::BadRepeatCount { index: 2 }.into())
        );
        assert_eq!(
            compile(numbered(&[set(20.0, 10), Instruction::Repeat { count: i64::MAX }])),
            Err(InvalidProgram::TooManySegments.into())
        );
    }

    #[test]
    fn test_hold_only_program() {
        let program = compile(numbered(&[Instruction::Hold { temperature: 42.0 }])).unwrap();
        assert_eq!(program.total_duration_s(), 0);
        assert_eq!(program.segments().len(), 1);
        assert!(program.has_hold());
    }

    #[test]
    fn test_instruction_after_hold_is_rejected() {
        assert_eq!(
            compile(numbered(&[
                Instruction::Hold { temperature: 42.0 },
                set(50.0, 10),
            ])),
            Err(InvalidProgram::InstructionAfterHold { index: 2 }.into())
        );
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(
            Program::from_json("{}"),
            Err(InvalidProgram::Empty.into())
        );
    }

    #[test]
    fn test_overlong_program() {
        assert_eq!(
            compile(numbered(&[set(20.0, i64::from(u32::MAX)), set(20.0, 1)])),
            Err(InvalidProgram::TooLong.into())
        );
    }

    fn instruction_strategy() -> impl Strategy<Value = Instruction> {
        prop_oneof![
            (20.0f32..100.0, 1i64..600).prop_map(|(t, d)| set(t, d)),
            (20.0f32..100.0, 20.0f32..100.0, 1i64..20).prop_map(|(a, b, n)| {
                Instruction::Linear {
                    start_temperature: a,
                    end_temperature: b,
                    duration: n * i64::from(LINEAR_STEP_S),
                }
            }),
            (1i64..4).prop_map(|count| Instruction::Repeat { count }),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_duration_is_sum_of_segments(
            body in prop::collection::vec(instruction_strategy(), 1..6),
            hold in prop::option::of(20.0f32..60.0),
        ) {
            let mut instructions = vec![set(25.0, 10)];
            instructions.extend(body);
            if let Some(temperature) = hold {
                instructions.push(Instruction::Hold { temperature });
            }

            let program = compile(numbered(&instructions)).unwrap();
            prop_assert_eq!(u64::from(program.total_duration_s()), finite_sum(&program));
            assert_contiguous(&program);
        }

        #[test]
        fn prop_repeat_is_periodic(
            block in prop::collection::vec((20.0f32..100.0, 1i64..120), 1..5),
            count in 1i64..4,
            t_frac in 0.0f64..1.0,
        ) {
            let mut instructions: Vec<Instruction> =
                block.iter().map(|&(t, d)| set(t, d)).collect();
            let block_s: i64 = block.iter().map(|&(_, d)| d).sum();
            instructions.push(Instruction::Repeat { count });

            let program = compile(numbered(&instructions)).unwrap();
            // Millisecond resolution keeps k * D + t clear of float rounding at boundaries
            let t = (t_frac * block_s as f64 * 1000.0).floor() / 1000.0;
            let first = desired_temperature(&program, t);
            prop_assert!(matches!(first, DesiredTemperature::Temperature(_)));
            for k in 0..=count {
                let later = desired_temperature(&program, (k * block_s) as f64 + t);
                prop_assert_eq!(later, first);
            }
        }
    }
}
