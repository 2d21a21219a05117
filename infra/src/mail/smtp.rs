//! SMTP mail transport using lettre

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use sv_core::services::verification::MailTransport;
use sv_shared::config::MailConfig;
use sv_shared::mask_email;

use crate::InfrastructureError;

/// Mail transport delivering through an SMTP relay with STARTTLS
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Domain used in generated Message-ID headers
    message_id_domain: String,
}

impl SmtpMailTransport {
    /// Create a new SMTP transport from configuration
    ///
    /// No connection is made until the first message is sent.
    pub fn new(config: &MailConfig) -> Result<Self, InfrastructureError> {
        let address: Address = config.from_address.parse().map_err(|_| {
            InfrastructureError::Config(format!(
                "Invalid sender address: {}",
                config.from_address
            ))
        })?;
        let message_id_domain = address.domain().to_string();
        let from = Mailbox::new(Some(config.from_name.clone()), address);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| InfrastructureError::Mail(format!("Invalid SMTP relay: {}", e)))?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
            message_id_domain,
        })
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        message_id: &str,
    ) -> Result<Message, String> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|_| format!("Invalid recipient address: {}", mask_email(to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .message_id(Some(message_id.to_string()))
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build message: {}", e))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_id_domain);
        let message = self.build_message(to, subject, html_body, &message_id)?;

        match self.mailer.send(message).await {
            Ok(response) => {
                info!(
                    to = %mask_email(to),
                    message_id = %message_id,
                    smtp_code = %response.code(),
                    "Email sent successfully"
                );
                Ok(message_id)
            }
            Err(e) => {
                error!(
                    to = %mask_email(to),
                    error = %e,
                    "SMTP delivery failed"
                );
                Err(format!("SMTP error: {}", e))
            }
        }
    }
}
