use thiserror::Error;

use super::alert_job::{AlertJob, AlertJobId};
use super::alert_message::AlertMessage;
use super::evidence_encoder::EvidenceEncoder;
use super::notification_transport::{NotificationTransport, TransportError};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to encode evidence for alert {job}: {source}")]
    Encode {
        job: AlertJobId,
        #[source]
        source: TransportError,
    },
    #[error("failed to send alert {job}: {source}")]
    Send {
        job: AlertJobId,
        #[source]
        source: TransportError,
    },
}

/// Encodes a job's evidence and delivers it with the alert template.
pub struct AlertNotifier {
    encoder: Box<dyn EvidenceEncoder>,
    transport: Box<dyn NotificationTransport>,
}

impl AlertNotifier {
    pub fn new(
        encoder: Box<dyn EvidenceEncoder>,
        transport: Box<dyn NotificationTransport>,
    ) -> Self {
        Self { encoder, transport }
    }

    pub fn dispatch(&self, job: &AlertJob) -> Result<(), NotifyError> {
        let image = self
            .encoder
            .encode(&job.evidence)
            .map_err(|source| NotifyError::Encode { job: job.id, source })?;
        let message = AlertMessage::for_job(job);
        self.transport
            .send(&message, &image, self.encoder.content_type())
            .map_err(|source| NotifyError::Send { job: job.id, source })
    }
}
