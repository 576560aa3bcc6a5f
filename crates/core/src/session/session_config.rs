use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::alerting::domain::presence_machine::PresenceConfig;
use crate::motion::infrastructure::background_difference_gate::MotionGateConfig;
use crate::shared::config_error::ConfigError;
use crate::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_WARMUP_FRAMES,
};

/// Everything the monitoring loop needs besides its collaborators.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub motion: MotionGateConfig,
    pub presence: PresenceConfig,
    /// Minimum detector confidence for a detection to count.
    pub confidence: f64,
    /// Frames discarded before the background reference is captured.
    pub warmup_frames: usize,
    /// How long teardown waits for in-flight alerts.
    pub shutdown_grace: Duration,
    /// Set from another thread to stop the loop after the current frame.
    pub cancelled: Arc<AtomicBool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            motion: MotionGateConfig::default(),
            presence: PresenceConfig::default(),
            confidence: DEFAULT_CONFIDENCE,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            shutdown_grace: Duration::from_secs_f64(DEFAULT_SHUTDOWN_GRACE_SECS),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::invalid(
                "confidence",
                format!("{} is outside [0, 1]", self.confidence),
            ));
        }
        if self.motion.blur_kernel == 0 || self.motion.blur_kernel % 2 == 0 {
            return Err(ConfigError::invalid(
                "blur_kernel",
                format!("{} must be a positive odd number", self.motion.blur_kernel),
            ));
        }
        if self.presence.confirm_delay.is_zero() {
            return Err(ConfigError::invalid("confirm_delay", "must be positive"));
        }
        if self.presence.cooldown.is_zero() {
            return Err(ConfigError::invalid("cooldown", "must be positive"));
        }
        Ok(())
    }
}

/// Converts a seconds value from user input, rejecting negative, NaN,
/// infinite and out-of-range values.
pub fn duration_from_secs(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::invalid(
            name,
            format!("{secs} is not a non-negative number of seconds"),
        ));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::invalid(name, format!("{secs} seconds: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[rstest]
    #[case::confidence_high(|c: &mut SessionConfig| c.confidence = 1.5, "confidence")]
    #[case::confidence_negative(|c: &mut SessionConfig| c.confidence = -0.1, "confidence")]
    #[case::even_kernel(|c: &mut SessionConfig| c.motion.blur_kernel = 20, "blur_kernel")]
    #[case::zero_kernel(|c: &mut SessionConfig| c.motion.blur_kernel = 0, "blur_kernel")]
    #[case::zero_delay(|c: &mut SessionConfig| c.presence.confirm_delay = Duration::ZERO, "confirm_delay")]
    #[case::zero_cooldown(|c: &mut SessionConfig| c.presence.cooldown = Duration::ZERO, "cooldown")]
    fn test_invalid_values_rejected(
        #[case] mutate: fn(&mut SessionConfig),
        #[case] field: &str,
    ) {
        let mut config = SessionConfig::default();
        mutate(&mut config);
        match config.validate() {
            Err(ConfigError::Invalid { name, .. }) => assert_eq!(name, field),
            other => panic!("expected invalid {field}, got {other:?}"),
        }
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(1e20)]
    #[case(f64::MAX)]
    fn test_duration_from_secs_rejects(#[case] secs: f64) {
        assert!(duration_from_secs("cooldown", secs).is_err());
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(
            duration_from_secs("cooldown", 2.5).unwrap(),
            Duration::from_millis(2500)
        );
    }
}
