use std::time::{Duration, Instant};

use crate::shared::constants::{DEFAULT_CONFIRM_DELAY_SECS, DEFAULT_COOLDOWN_SECS};
use crate::shared::frame::Frame;

use super::alert_job::{AlertJob, AlertJobId, DispatchOutcome};

/// Timing rules for confirming a presence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresenceConfig {
    /// Continuous detection required before an alert fires.
    pub confirm_delay: Duration,
    /// Continuous absence required before the next alert may fire.
    pub cooldown: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            confirm_delay: Duration::from_secs_f64(DEFAULT_CONFIRM_DELAY_SECS),
            cooldown: Duration::from_secs_f64(DEFAULT_COOLDOWN_SECS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceState {
    Idle,
    /// A person has been seen continuously since `since`.
    Armed { since: Instant },
    /// `job` was fired for the current episode; `last_seen` is the most
    /// recent frame with a person in it.
    Alerted { last_seen: Instant, job: AlertJobId },
}

/// Debounces per-frame person detections into at most one alert per
/// presence episode.
///
/// All durations are measured on the frames' monotonic instants and compared
/// inclusively.
#[derive(Debug)]
pub struct PresenceMachine {
    config: PresenceConfig,
    state: PresenceState,
    next_job: u64,
}

impl PresenceMachine {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            state: PresenceState::Idle,
            next_job: 1,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Advances the machine by one processed frame.
    ///
    /// Returns a job only on the Armed → Alerted transition; the job carries
    /// a clone of `frame` as evidence.
    pub fn tick(&mut self, person: bool, frame: &Frame) -> Option<AlertJob> {
        let now = frame.timestamp().instant;
        match (self.state, person) {
            (PresenceState::Idle, true) => {
                self.state = PresenceState::Armed { since: now };
                None
            }
            (PresenceState::Idle, false) => None,
            (PresenceState::Armed { since }, true) => {
                if now.saturating_duration_since(since) >= self.config.confirm_delay {
                    let id = AlertJobId(self.next_job);
                    self.next_job += 1;
                    self.state = PresenceState::Alerted {
                        last_seen: now,
                        job: id,
                    };
                    Some(AlertJob {
                        id,
                        evidence: frame.clone(),
                        fired_at: frame.timestamp(),
                    })
                } else {
                    None
                }
            }
            (PresenceState::Armed { .. }, false) => {
                self.state = PresenceState::Idle;
                None
            }
            (PresenceState::Alerted { job, .. }, true) => {
                self.state = PresenceState::Alerted {
                    last_seen: now,
                    job,
                };
                None
            }
            (PresenceState::Alerted { last_seen, .. }, false) => {
                if now.saturating_duration_since(last_seen) >= self.config.cooldown {
                    self.state = PresenceState::Idle;
                }
                None
            }
        }
    }

    /// A motion episode ended: whatever was pending is dropped.
    pub fn motion_ended(&mut self) {
        self.state = PresenceState::Idle;
    }

    /// Feeds back a dispatch result.
    ///
    /// A failure for the job that put the machine into its current Alerted
    /// state resets it to Idle so the presence can be re-confirmed. Returns
    /// whether the state changed.
    pub fn apply_outcome(&mut self, outcome: &DispatchOutcome) -> bool {
        match self.state {
            PresenceState::Alerted { job, .. } if job == outcome.job_id && outcome.is_failure() => {
                self.state = PresenceState::Idle;
                true
            }
            _ => false,
        }
    }
}

impl Default for PresenceMachine {
    fn default() -> Self {
        Self::new(PresenceConfig::default())
    }
}
