//! Configuration loading
//!
//! Reads the TOML file named on the command line, by `PIWARMER_CONFIG`, or
//! at [`DEFAULT_CONFIG_PATH`]. Falls back to embedded defaults if the file
//! does not exist; a file that exists but does not parse is an error.

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::types::DaemonConfig;
use crate::error::DaemonError;

/// Embedded default configuration (compiled into the binary)
/// Edit piwarmer.toml and rebuild to customize
pub const EMBEDDED_CONFIG: &str = include_str!("../../piwarmer.toml");

/// Config file used when neither the command line nor the environment names one
pub const DEFAULT_CONFIG_PATH: &str = "/etc/piwarmer/piwarmer.toml";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "PIWARMER_CONFIG";

/// Environment variable overriding `sensor.min_believable_temperature`
pub const MIN_TEMPERATURE_ENV: &str = "MINIMUM_BELIEVABLE_TEMPERATURE";

/// Resolve the config file path
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load, apply environment overrides, and validate
pub fn load(path: &Path) -> Result<DaemonConfig, DaemonError> {
    let mut config = match std::fs::read_to_string(path) {
        Ok(text) => {
            info!("Loading configuration from {}", path.display());
            parse_config(&text)?
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "No configuration at {}, using embedded defaults",
                path.display()
            );
            parse_config(EMBEDDED_CONFIG)?
        }
        Err(source) => {
            return Err(DaemonError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    config.validate()?;
    log_config_summary(&config);
    Ok(config)
}

/// Parse TOML text; missing sections and fields take their defaults
pub fn parse_config(text: &str) -> Result<DaemonConfig, DaemonError> {
    Ok(toml::from_str(text)?)
}

/// Apply environment overrides through `lookup`
pub fn apply_env_overrides<F>(config: &mut DaemonConfig, lookup: F) -> Result<(), DaemonError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(MIN_TEMPERATURE_ENV) {
        let value: f32 = raw.trim().parse().map_err(|_| DaemonError::ConfigValue {
            field: MIN_TEMPERATURE_ENV,
            reason: format!("`{raw}` is not a number"),
        })?;
        info!("{MIN_TEMPERATURE_ENV} overrides minimum believable temperature: {value}°C");
        config.sensor.min_believable_temperature = value;
    }
    Ok(())
}

fn log_config_summary(config: &DaemonConfig) {
    info!(
        "Config: backend={:?}, probe={:?}, interval={}ms, kp={}, ki={}, max={}°C",
        config.hardware.backend,
        config.hardware.probe,
        config.control.poll_interval_ms,
        config.pid.kp,
        config.pid.ki,
        config.control.max_temperature
    );
}
