//! Persisted run state
//!
//! The store is the one resource shared with other processes: a web front
//! end writes `program` and flips `active`, the control loop publishes
//! progress. Values are strings; the typed [`RunStore`] layer on top knows
//! how each key is encoded.

use alloc::format;
use alloc::string::String;
use core::fmt;

use crate::program::UpcomingStep;

/// Keys shared with the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreKey {
    /// `1` while a run is requested, `0` or absent otherwise
    Active,
    /// Program JSON
    Program,
    /// Latest reading (°C)
    CurrentTemp,
    /// Latest set point (°C)
    CurrentSetting,
    /// Label of the running step
    CurrentStep,
    SecondsLeft,
    MinutesLeft,
    /// JSON list of `{label, countdown}`
    UpcomingSteps,
    /// Hash of run start timestamp to sampled readings
    History,
}

impl StoreKey {
    /// Keys removed when a run ends
    ///
    /// `program` and `history` survive so the front end can show what ran.
    pub const RUN_STATE: [StoreKey; 7] = [
        StoreKey::Active,
        StoreKey::CurrentTemp,
        StoreKey::CurrentSetting,
        StoreKey::CurrentStep,
        StoreKey::SecondsLeft,
        StoreKey::MinutesLeft,
        StoreKey::UpcomingSteps,
    ];

    /// Key name as seen by other processes
    pub const fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Active => "active",
            StoreKey::Program => "program",
            StoreKey::CurrentTemp => "current_temp",
            StoreKey::CurrentSetting => "current_setting",
            StoreKey::CurrentStep => "current_step",
            StoreKey::SecondsLeft => "seconds_left",
            StoreKey::MinutesLeft => "minutes_left",
            StoreKey::UpcomingSteps => "upcoming_steps",
            StoreKey::History => "history",
        }
    }
}

/// Errors from the persisted store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Backing storage could not be read or written
    Io,
    /// A value is present but not in the expected encoding
    Malformed(StoreKey),
    /// A run was requested but no program is stored
    MissingProgram,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io => f.write_str("state store I/O failed"),
            StoreError::Malformed(key) => write!(f, "stored `{}` is malformed", key.as_str()),
            StoreError::MissingProgram => f.write_str("no program stored"),
        }
    }
}

/// String key-value store with hash fields
///
/// Each operation is atomic on its own; nothing spans keys.
pub trait KeyValueStore {
    /// Read a value; `None` when absent
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value; removing an absent key is not an error
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Append to one field of a hash value, creating it if needed
    fn append_field(&mut self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn append_field(&mut self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        (**self).append_field(key, field, value)
    }
}

/// Typed access to the run keys
///
/// Implemented for every [`KeyValueStore`].
pub trait RunStore: KeyValueStore {
    /// Whether a run is requested
    ///
    /// Accepts `1`/`0` and `true`/`false`; absent means inactive.
    fn is_active(&mut self) -> Result<bool, StoreError> {
        let Some(value) = self.get(StoreKey::Active.as_str())? else {
            return Ok(false);
        };
        match value.trim() {
            "1" | "true" | "True" => Ok(true),
            "0" | "false" | "False" | "" => Ok(false),
            _ => Err(StoreError::Malformed(StoreKey::Active)),
        }
    }

    fn set_active(&mut self, active: bool) -> Result<(), StoreError> {
        self.set(StoreKey::Active.as_str(), if active { "1" } else { "0" })
    }

    /// Raw program JSON
    fn program(&mut self) -> Result<String, StoreError> {
        self.get(StoreKey::Program.as_str())?
            .ok_or(StoreError::MissingProgram)
    }

    fn set_program(&mut self, json: &str) -> Result<(), StoreError> {
        self.set(StoreKey::Program.as_str(), json)
    }

    fn publish_current_temp(&mut self, temperature: f32) -> Result<(), StoreError> {
        self.set(StoreKey::CurrentTemp.as_str(), &format!("{temperature:.2}"))
    }

    /// Publish everything the front end shows about a running program
    fn publish_progress(&mut self, progress: &Progress<'_>) -> Result<(), StoreError> {
        self.set(
            StoreKey::CurrentSetting.as_str(),
            &format!("{:.2}", progress.desired_temperature),
        )?;
        self.set(StoreKey::CurrentStep.as_str(), progress.current_step)?;
        self.set(
            StoreKey::SecondsLeft.as_str(),
            &format!("{}", progress.seconds_left),
        )?;
        self.set(
            StoreKey::MinutesLeft.as_str(),
            &format!("{}", progress.minutes_left),
        )?;
        let upcoming = serde_json::to_string(progress.upcoming)
            .map_err(|_| StoreError::Malformed(StoreKey::UpcomingSteps))?;
        self.set(StoreKey::UpcomingSteps.as_str(), &upcoming)
    }

    /// Append one `(elapsed, temperature)` sample to a run's history
    fn append_history(
        &mut self,
        run_key: &str,
        elapsed_s: f64,
        temperature: f32,
    ) -> Result<(), StoreError> {
        self.append_field(
            StoreKey::History.as_str(),
            run_key,
            &format!("{elapsed_s:.1}\t{temperature:.2}\n"),
        )
    }

    /// Remove every run key, attempting all even if some fail
    ///
    /// Returns the first failure.
    fn clear_run_state(&mut self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in StoreKey::RUN_STATE {
            if let Err(e) = self.delete(key.as_str()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<T: KeyValueStore + ?Sized> RunStore for T {}

/// Snapshot published once per RUN cycle
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub desired_temperature: f32,
    /// Label of the running step
    pub current_step: &'a str,
    pub seconds_left: u32,
    pub minutes_left: u32,
    pub upcoming: &'a [UpcomingStep],
}
