//! Best-effort action isolation
//!
//! Shutdown has to do several things (turn the heater off, clear the run
//! state) and a failure in one must never stop the others. [`Isolated`] runs
//! every action in order, records failures and never returns early:
//!
//! ```
//! use piwarmer_core::safety::Isolated;
//!
//! let report = Isolated::new()
//!     .attempt("disable heater", || Err("gpio write failed"))
//!     .attempt("clear run state", || Ok(()))
//!     .finish();
//!
//! assert_eq!(report.attempted(), 2);
//! assert!(report.failed("disable heater"));
//! ```

use alloc::vec::Vec;

/// A best-effort action that failed
#[derive(Debug, Clone, PartialEq)]
pub struct IsolatedFailure<E> {
    /// Name the action was registered under
    pub action: &'static str,
    pub error: E,
}

/// Outcome of a sequence of isolated actions
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationReport<E> {
    attempted: usize,
    failures: Vec<IsolatedFailure<E>>,
}

impl<E> IsolationReport<E> {
    /// Number of actions that were run
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Failures in the order the actions ran
    pub fn failures(&self) -> &[IsolatedFailure<E>] {
        &self.failures
    }

    /// Whether every action succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the named action failed
    pub fn failed(&self, action: &str) -> bool {
        self.failures.iter().any(|f| f.action == action)
    }
}

/// Runs best-effort actions, recording failures instead of propagating them
#[derive(Debug)]
#[must_use = "call finish() to inspect failures"]
pub struct Isolated<E> {
    report: IsolationReport<E>,
}

impl<E> Default for Isolated<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Isolated<E> {
    pub fn new() -> Self {
        Self {
            report: IsolationReport {
                attempted: 0,
                failures: Vec::new(),
            },
        }
    }

    /// Run `action` now; a failure is recorded and the chain continues
    pub fn attempt<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: FnOnce() -> Result<(), E>,
    {
        self.report.attempted += 1;
        if let Err(error) = action() {
            self.report.failures.push(IsolatedFailure {
                action: name,
                error,
            });
        }
        self
    }

    /// Stop and hand back what happened
    pub fn finish(self) -> IsolationReport<E> {
        self.report
    }
}
