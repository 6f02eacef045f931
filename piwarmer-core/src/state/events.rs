//! Events that trigger state transitions

use super::machine::FaultKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle events
    /// Stale run state cleared at process start
    BootComplete,
    /// Cleanup after a run has finished
    ShutdownComplete,

    // Store events
    /// The `active` flag was found set
    Activated,
    /// The `active` flag was found cleared during a run
    Stopped,

    // Run events
    /// Program compiled, telemetry open, heater enabled at duty 0
    RunStarted,
    /// Evaluator reports the program has no more steps
    ProgramFinished,

    // Safety events
    /// A collaborator failed
    FaultDetected(FaultKind),
}
