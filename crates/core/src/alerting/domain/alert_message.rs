use crate::shared::constants::{ALERT_ATTACHMENT_NAME, ALERT_SUBJECT};

use super::alert_job::AlertJob;

/// Text parts of an alert email. The evidence image travels separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
}

impl AlertMessage {
    pub fn for_job(job: &AlertJob) -> Self {
        let seen_at = job.fired_at.wall.format("%Y-%m-%d %H:%M:%S");
        Self {
            subject: ALERT_SUBJECT.to_string(),
            body: format!(
                "A PERSON was detected in the monitored area at {seen_at}.\n\n\
                 The evidence capture is attached."
            ),
            attachment_name: ALERT_ATTACHMENT_NAME.to_string(),
        }
    }
}
