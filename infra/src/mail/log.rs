//! Logging mail transport for development
//!
//! Messages are written to the log instead of being delivered, which makes
//! the code visible to a developer running the service locally.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use uuid::Uuid;

use sv_core::services::verification::MailTransport;
use sv_shared::mask_email;

/// Mail transport that logs messages and never contacts a server
#[derive(Debug, Default)]
pub struct LogMailTransport {
    fail: AtomicBool,
}

impl LogMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that rejects every message
    pub fn failing() -> Self {
        let transport = Self::new();
        transport.set_failing(true);
        transport
    }

    /// Toggle simulated delivery failure
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("Simulated mail delivery failure".to_string());
        }

        let message_id = format!("log-{}", Uuid::new_v4());
        info!(
            to = %mask_email(to),
            subject = %subject,
            message_id = %message_id,
            "Email (not sent, log transport)\n{}",
            html_body
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_returns_message_id() {
        let transport = LogMailTransport::new();
        let id = transport
            .send("user@example.com", "Verify", "<p>AB12CD</p>")
            .await
            .unwrap();
        assert!(id.starts_with("log-"));
    }

    #[tokio::test]
    async fn test_simulated_failure_can_be_toggled() {
        let transport = LogMailTransport::failing();
        assert!(transport.send("user@example.com", "Verify", "").await.is_err());

        transport.set_failing(false);
        assert!(transport.send("user@example.com", "Verify", "").await.is_ok());
    }
}
