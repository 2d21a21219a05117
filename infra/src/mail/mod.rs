//! Mail Transport Module
//!
//! Implementations of the `MailTransport` trait from `sv_core`:
//!
//! - **SMTP**: Delivery through an SMTP relay (STARTTLS) via lettre
//! - **Log**: Writes messages to the log for development; can simulate failure
//! - **Security**: Recipient addresses are masked in logs

pub mod log;
pub mod smtp;

pub use self::log::LogMailTransport;
pub use smtp::SmtpMailTransport;

use std::sync::Arc;

use sv_core::services::verification::MailTransport;
use sv_shared::config::{MailConfig, MailTransportKind};

use crate::InfrastructureError;

/// Create a mail transport based on configuration
///
/// # Returns
///
/// The transport selected by `mail.transport`, or an error when the SMTP
/// settings cannot be used.
pub fn create_mail_transport(
    config: &MailConfig,
) -> Result<Arc<dyn MailTransport>, InfrastructureError> {
    match config.transport {
        MailTransportKind::Log => {
            tracing::warn!("Using log mail transport; verification emails will not be delivered");
            Ok(Arc::new(LogMailTransport::new()))
        }
        MailTransportKind::Smtp => {
            let transport = SmtpMailTransport::new(config)?;
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "Using SMTP mail transport"
            );
            Ok(Arc::new(transport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_log_transport() {
        let transport = create_mail_transport(&MailConfig::default()).unwrap();
        let message_id = transport
            .send("user@example.com", "Subject", "<p>Body</p>")
            .await
            .unwrap();
        assert!(message_id.starts_with("log-"));
    }

    #[tokio::test]
    async fn test_creates_smtp_transport() {
        let config = MailConfig {
            transport: MailTransportKind::Smtp,
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "sender@example.com".to_string(),
            smtp_password: "secret".to_string(),
            ..Default::default()
        };
        assert!(create_mail_transport(&config).is_ok());
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let config = MailConfig {
            transport: MailTransportKind::Smtp,
            from_address: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_mail_transport(&config),
            Err(InfrastructureError::Config(_))
        ));
    }
}
