//! Per-run telemetry files
//!
//! One tab-separated line per RUN cycle (`current`, `desired`, `duty`) in
//! `temperature-YYYY-MM-DD-HH-MM-SS.log`, named after the run's start.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::{debug, info};
use piwarmer_core::traits::{TelemetryError, TelemetryRecord, TelemetrySink};

/// Telemetry written to a directory of log files
#[derive(Debug)]
pub struct FileTelemetry {
    dir: PathBuf,
    current: Option<(PathBuf, BufWriter<File>)>,
}

impl FileTelemetry {
    /// Log into `dir`, created on the first run
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// File name for a run started at `run_key` (`YYYY-MM-DD HH:MM:SS`)
    pub fn file_name(run_key: &str) -> String {
        format!("temperature-{}.log", run_key.replace([' ', ':'], "-"))
    }
}

impl TelemetrySink for FileTelemetry {
    fn begin_run(&mut self, run_key: &str) -> Result<(), TelemetryError> {
        self.end_run();
        fs::create_dir_all(&self.dir).map_err(|e| {
            debug!("{}: {e}", self.dir.display());
            TelemetryError::Open
        })?;

        let path = self.dir.join(Self::file_name(run_key));
        let file = File::create(&path).map_err(|e| {
            debug!("{}: {e}", path.display());
            TelemetryError::Open
        })?;
        info!("Telemetry: {}", path.display());
        self.current = Some((path, BufWriter::new(file)));
        Ok(())
    }

    fn record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let (_, writer) = self.current.as_mut().ok_or(TelemetryError::NotStarted)?;
        writeln!(
            writer,
            "{}\t{}\t{}",
            record.current_temperature, record.desired_temperature, record.duty_cycle
        )
        .and_then(|()| writer.flush())
        .map_err(|_| TelemetryError::Write)
    }

    fn end_run(&mut self) {
        if let Some((path, mut writer)) = self.current.take() {
            if let Err(e) = writer.flush() {
                debug!("{}: {e}", path.display());
            }
        }
    }
}
