use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::alerting::domain::alert_message::AlertMessage;
use crate::alerting::domain::notification_transport::{NotificationTransport, TransportError};
use crate::shared::config_error::ConfigError;

/// Sender login and alert recipient, validated at startup.
#[derive(Clone)]
pub struct SmtpCredentials {
    sender: Mailbox,
    password: String,
    recipient: Mailbox,
}

impl SmtpCredentials {
    pub fn new(sender: &str, password: &str, recipient: &str) -> Result<Self, ConfigError> {
        let sender = parse_mailbox("smtp user", sender)?;
        if password.is_empty() {
            return Err(ConfigError::Missing("smtp password"));
        }
        let recipient = parse_mailbox("alert recipient", recipient)?;
        Ok(Self {
            sender,
            password: password.to_string(),
            recipient,
        })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn recipient(&self) -> &Mailbox {
        &self.recipient
    }
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("sender", &self.sender.to_string())
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient.to_string())
            .finish()
    }
}

fn parse_mailbox(name: &'static str, value: &str) -> Result<Mailbox, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    value
        .parse()
        .map_err(|e: lettre::address::AddressError| ConfigError::invalid(name, e.to_string()))
}

/// Sends alerts as multipart email over implicit-TLS SMTP (port 465).
pub struct SmtpMailTransport {
    mailer: SmtpTransport,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(host: &str, credentials: SmtpCredentials) -> Result<Self, Box<dyn std::error::Error>> {
        let login = Credentials::new(
            credentials.sender.email.to_string(),
            credentials.password.clone(),
        );
        let mailer = SmtpTransport::relay(host)?.credentials(login).build();
        log::info!(
            "Alerts will be sent via {host} from {} to {}",
            credentials.sender,
            credentials.recipient
        );
        Ok(Self {
            mailer,
            sender: credentials.sender,
            recipient: credentials.recipient,
        })
    }

    fn build_message(
        &self,
        message: &AlertMessage,
        attachment: &[u8],
        content_type: &str,
    ) -> Result<Message, TransportError> {
        let content_type = ContentType::parse(content_type)?;
        let email = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(message.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(message.body.clone()))
                    .singlepart(
                        Attachment::new(message.attachment_name.clone())
                            .body(attachment.to_vec(), content_type),
                    ),
            )?;
        Ok(email)
    }
}

impl NotificationTransport for SmtpMailTransport {
    fn send(
        &self,
        message: &AlertMessage,
        attachment: &[u8],
        content_type: &str,
    ) -> Result<(), TransportError> {
        let email = self.build_message(message, attachment, content_type)?;
        log::debug!("Connecting to SMTP server...");
        self.mailer.send(&email)?;
        Ok(())
    }
}
