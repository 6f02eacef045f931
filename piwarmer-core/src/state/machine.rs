//! State machine definition
//!
//! Heater permission is a function of the current state alone.

use core::fmt;

use super::events::Event;

/// Control loop states
///
/// `Boot` runs once; the rest cycle
/// `Listen → PreRun → Run → Shutdown → Listen` forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Process start, stale run state cleared
    Boot,
    /// Idle, polling the `active` flag
    Listen,
    /// Loading the program and arming the heater
    PreRun,
    /// Closed-loop control, one cycle per interval
    Run,
    /// Heater off, run state cleared
    Shutdown,
}

/// Which collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Program missing, unparsable or invalid
    Program,
    /// Temperature sensor failed or never gave a believable reading
    Sensor,
    /// Heater could not be enabled or driven
    Actuator,
    /// The `active` flag could not be read
    Store,
}

impl State {
    /// Check if this state allows the heater to be enabled
    pub fn heater_allowed(&self) -> bool {
        matches!(self, State::PreRun | State::Run)
    }

    /// Process an event and return the next state
    ///
    /// This is the core state transition logic. Every path out of a run
    /// goes through `Shutdown`.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Boot transitions
            (Boot, BootComplete) => Listen,
            (Boot, FaultDetected(_)) => Shutdown,

            // Listen transitions
            (Listen, Activated) => PreRun,

            // PreRun transitions
            (PreRun, RunStarted) => Run,
            (PreRun, Stopped) => Shutdown,
            (PreRun, FaultDetected(_)) => Shutdown,

            // Run transitions
            (Run, Stopped) => Shutdown,
            (Run, ProgramFinished) => Shutdown,
            (Run, FaultDetected(_)) => Shutdown,

            // Shutdown transitions
            (Shutdown, ShutdownComplete) => Listen,

            // Default: stay in current state
            _ => self,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Boot => "BOOT",
            State::Listen => "LISTEN",
            State::PreRun => "PRERUN",
            State::Run => "RUN",
            State::Shutdown => "SHUTDOWN",
        })
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FaultKind::Program => "program",
            FaultKind::Sensor => "sensor",
            FaultKind::Actuator => "actuator",
            FaultKind::Store => "store",
        })
    }
}
