//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields the stock
//! greeting setup.

use crate::calibration::CalibrationSettings;
use crate::clock::checked_units_to_duration;
use crate::harness::SpawnOptions;
use crate::speech::VoiceSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Hold timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wall-clock seconds per hold unit.
    pub time_unit_secs: f64,
    /// Hold after the initial posture, in time units.
    pub initial_settle: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            time_unit_secs: 1.0,
            initial_settle: 1.0,
        }
    }
}

impl TimingConfig {
    /// Length of one hold unit. Out-of-range values saturate instead of panicking;
    /// [`GreeterConfig::validate`] rejects them up front.
    pub fn time_unit(&self) -> Duration {
        match Duration::try_from_secs_f64(self.time_unit_secs) {
            Ok(unit) => unit,
            Err(_) if self.time_unit_secs > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub speech: VoiceSettings,
    pub timing: TimingConfig,
    pub calibration: CalibrationSettings,
    pub spawn: SpawnOptions,
}

impl GreeterConfig {
    /// Loads `path`, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secs = self.timing.time_unit_secs;
        let Ok(unit) = Duration::try_from_secs_f64(secs) else {
            return Err(ConfigError::Invalid(format!(
                "timing.time_unit_secs must be a non-negative number of seconds, got {secs}"
            )));
        };
        let cal = &self.calibration;
        for (name, units) in [
            ("timing.initial_settle", self.timing.initial_settle),
            ("calibration.settle", cal.settle),
        ] {
            if !(units.is_finite() && units >= 0.0)
                || checked_units_to_duration(unit, units).is_none()
            {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative hold that fits in time, got {units}"
                )));
            }
        }
        if !(cal.min_angle <= cal.max_angle) {
            return Err(ConfigError::Invalid(format!(
                "calibration range [{}, {}] is empty",
                cal.min_angle, cal.max_angle
            )));
        }
        if !(cal.speed > 0.0 && cal.speed <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "calibration.speed {} is outside (0, 1]",
                cal.speed
            )));
        }
        if cal.exit_keyword.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "calibration.exit_keyword must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
