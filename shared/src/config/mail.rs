//! Outgoing mail configuration

use serde::{Deserialize, Serialize};

use super::Environment;

/// Mail transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    /// Write messages to the log instead of sending them
    Log,
    /// Send through an SMTP relay
    Smtp,
}

impl Default for MailTransportKind {
    fn default() -> Self {
        MailTransportKind::Log
    }
}

/// Mail configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: MailTransportKind,

    /// SMTP relay host
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP port (STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username; empty disables authentication
    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    /// Sender address
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Sender display name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// SMTP command timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransportKind::default(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: default_from_address(),
            from_name: default_from_name(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl MailConfig {
    /// Production sends real mail; everything else logs it
    pub fn for_environment(env: Environment) -> Self {
        let transport = if env.is_production() {
            MailTransportKind::Smtp
        } else {
            MailTransportKind::Log
        };

        Self {
            transport,
            ..Default::default()
        }
    }

    /// Whether SMTP credentials were supplied
    pub fn has_credentials(&self) -> bool {
        !self.smtp_username.is_empty()
    }

    /// `"Name" <address>` mailbox string for the From header
    pub fn from_mailbox(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.from_address)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.from_address.trim().is_empty() {
            return Err("mail.from_address must not be empty".to_string());
        }
        if self.transport == MailTransportKind::Smtp && self.smtp_host.trim().is_empty() {
            return Err("mail.smtp_host is required for the smtp transport".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.smtp_password.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };

        f.debug_struct("MailConfig")
            .field("transport", &self.transport)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &password)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_smtp_host() -> String {
    String::from("smtp.gmail.com")
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    String::from("noreply@safevoice.app")
}

fn default_from_name() -> String {
    String::from("SafeVoice")
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = MailConfig {
            smtp_username: "sender@example.com".to_string(),
            smtp_password: "app-password-123".to_string(),
            ..Default::default()
        };

        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("app-password-123"));
        assert!(config.has_credentials());
    }

    #[test]
    fn test_from_mailbox() {
        let config = MailConfig {
            from_address: "team@safevoice.app".to_string(),
            ..Default::default()
        };
        assert_eq!(config.from_mailbox(), "\"SafeVoice\" <team@safevoice.app>");
    }

    #[test]
    fn test_transport_per_environment() {
        assert_eq!(
            MailConfig::for_environment(Environment::Development).transport,
            MailTransportKind::Log
        );
        assert_eq!(
            MailConfig::for_environment(Environment::Production).transport,
            MailTransportKind::Smtp
        );
    }

    #[test]
    fn test_smtp_requires_host() {
        let config = MailConfig {
            transport: MailTransportKind::Smtp,
            smtp_host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
