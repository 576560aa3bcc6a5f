use super::alert_message::AlertMessage;

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque "send evidence" sink.
///
/// Called from dispatcher worker threads, so implementations must be
/// shareable.
pub trait NotificationTransport: Send + Sync {
    fn send(
        &self,
        message: &AlertMessage,
        attachment: &[u8],
        content_type: &str,
    ) -> Result<(), TransportError>;
}
