use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alerting::domain::presence_machine::PresenceConfig;
use crate::motion::infrastructure::background_difference_gate::MotionGateConfig;
use crate::shared::config_error::ConfigError;
use crate::shared::constants::{
    DEFAULT_BLUR_KERNEL, DEFAULT_CONFIDENCE, DEFAULT_CONFIRM_DELAY_SECS, DEFAULT_COOLDOWN_SECS,
    DEFAULT_DIFF_THRESHOLD, DEFAULT_DILATE_ITERATIONS, DEFAULT_EVENT_LOG_PATH,
    DEFAULT_MIN_MOTION_AREA, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_SMTP_HOST,
    DEFAULT_WARMUP_FRAMES,
};

use super::session_config::{duration_from_secs, SessionConfig};

/// Tuning values from the JSON settings file or the command line.
///
/// Every field is optional: unset values fall through to the next layer
/// (CLI flags over file over built-in defaults).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSettings {
    pub confirm_delay_secs: Option<f64>,
    pub cooldown_secs: Option<f64>,
    pub diff_threshold: Option<u8>,
    pub min_motion_area: Option<u32>,
    pub blur_kernel: Option<usize>,
    pub dilate_iterations: Option<usize>,
    pub confidence: Option<f64>,
    pub warmup_frames: Option<usize>,
    pub shutdown_grace_secs: Option<f64>,
    pub output: Option<PathBuf>,
    pub smtp_host: Option<String>,
    pub model_url: Option<String>,
}

impl MonitorSettings {
    /// `<config dir>/watchpost/settings.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("watchpost").join("settings.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the settings file at `path`, or at the default location when
    /// `path` is `None`. A missing default file yields empty settings; a
    /// missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => {
                    log::info!("Using settings from {}", p.display());
                    Self::load(&p)
                }
                _ => Ok(Self::default()),
            },
        }
    }

    /// Layers `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: MonitorSettings) -> MonitorSettings {
        MonitorSettings {
            confirm_delay_secs: overrides.confirm_delay_secs.or(self.confirm_delay_secs),
            cooldown_secs: overrides.cooldown_secs.or(self.cooldown_secs),
            diff_threshold: overrides.diff_threshold.or(self.diff_threshold),
            min_motion_area: overrides.min_motion_area.or(self.min_motion_area),
            blur_kernel: overrides.blur_kernel.or(self.blur_kernel),
            dilate_iterations: overrides.dilate_iterations.or(self.dilate_iterations),
            confidence: overrides.confidence.or(self.confidence),
            warmup_frames: overrides.warmup_frames.or(self.warmup_frames),
            shutdown_grace_secs: overrides.shutdown_grace_secs.or(self.shutdown_grace_secs),
            output: overrides.output.or(self.output),
            smtp_host: overrides.smtp_host.or(self.smtp_host),
            model_url: overrides.model_url.or(self.model_url),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENT_LOG_PATH))
    }

    pub fn smtp_host(&self) -> &str {
        self.smtp_host.as_deref().unwrap_or(DEFAULT_SMTP_HOST)
    }

    /// Resolves defaults and validates the result.
    pub fn to_session_config(&self) -> Result<SessionConfig, ConfigError> {
        let config = SessionConfig {
            motion: MotionGateConfig {
                diff_threshold: self.diff_threshold.unwrap_or(DEFAULT_DIFF_THRESHOLD),
                blur_kernel: self.blur_kernel.unwrap_or(DEFAULT_BLUR_KERNEL),
                dilate_iterations: self.dilate_iterations.unwrap_or(DEFAULT_DILATE_ITERATIONS),
                min_area: self.min_motion_area.unwrap_or(DEFAULT_MIN_MOTION_AREA),
            },
            presence: PresenceConfig {
                confirm_delay: duration_from_secs(
                    "confirm_delay",
                    self.confirm_delay_secs.unwrap_or(DEFAULT_CONFIRM_DELAY_SECS),
                )?,
                cooldown: duration_from_secs(
                    "cooldown",
                    self.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS),
                )?,
            },
            confidence: self.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            warmup_frames: self.warmup_frames.unwrap_or(DEFAULT_WARMUP_FRAMES),
            shutdown_grace: duration_from_secs(
                "shutdown_grace",
                self.shutdown_grace_secs.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
            )?,
            ..SessionConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
