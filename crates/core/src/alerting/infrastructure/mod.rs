pub mod jpeg_evidence_encoder;
pub mod smtp_mail_transport;
pub mod threaded_alert_dispatcher;
