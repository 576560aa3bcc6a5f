use std::fmt;

use crate::shared::frame::Frame;
use crate::shared::timestamp::Timestamp;

/// Identifies one fired alert across the dispatcher boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertJobId(pub u64);

impl fmt::Display for AlertJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A confirmed presence, ready to be sent.
///
/// Owns its evidence frame: the dispatcher worker consumes it without
/// sharing pixels with the capture loop.
#[derive(Clone, Debug)]
pub struct AlertJob {
    pub id: AlertJobId,
    pub evidence: Frame,
    pub fired_at: Timestamp,
}

/// Completion signal for a dispatched job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub job_id: AlertJobId,
    pub result: Result<(), String>,
}

impl DispatchOutcome {
    pub fn delivered(job_id: AlertJobId) -> Self {
        Self {
            job_id,
            result: Ok(()),
        }
    }

    pub fn failed(job_id: AlertJobId, message: impl Into<String>) -> Self {
        Self {
            job_id,
            result: Err(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}
