//! Shared fixtures for the HTTP integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use sv_api::AppState;
use chrono::{DateTime, Duration, Utc};
use sv_core::domain::entities::VerificationRecord;
use sv_core::services::verification::{AttemptTracker, MailTransport, VerificationStore};
use sv_infra::{MemoryStore, StoreHandles};
use sv_shared::{AppConfig, Environment, VerificationConfig};

/// A message captured by `RecordingMailTransport`
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mail transport that keeps every message for inspection
#[derive(Default)]
pub struct RecordingMailTransport {
    messages: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingMailTransport {
    /// Records messages but reports delivery failure
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail.store(true, Ordering::SeqCst);
        transport
    }

    pub fn sent_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Code from the most recent message to `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.to == to)
            .and_then(|mail| extract_code(&mail.html))
    }

    pub fn last_message(&self) -> Option<SentMail> {
        self.messages.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String> {
        self.messages.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        });

        if self.fail.load(Ordering::SeqCst) {
            return Err("Recipient rejected".to_string());
        }
        Ok(format!("test-{}", self.sent_count()))
    }
}

/// Pull the code out of a rendered verification email
pub fn extract_code(html: &str) -> Option<String> {
    let marker = html.find("class=\"verification-code\"")?;
    let rest = &html[marker..];
    let open = rest.find('>')? + 1;
    let close = rest[open..].find('<')?;
    Some(rest[open..open + close].trim().to_string())
}

/// Store whose backing storage never answers
pub struct UnreachableStore;

const UNREACHABLE: &str = "Connection refused";

#[async_trait]
impl VerificationStore for UnreachableStore {
    async fn insert(&self, _record: VerificationRecord) -> Result<(), String> {
        Err(UNREACHABLE.to_string())
    }

    async fn take(&self, _email: &str, _code: &str) -> Result<Option<VerificationRecord>, String> {
        Err(UNREACHABLE.to_string())
    }

    async fn remove_all(&self, _email: &str) -> Result<u64, String> {
        Err(UNREACHABLE.to_string())
    }

    async fn replace_all(&self, _record: VerificationRecord) -> Result<u64, String> {
        Err(UNREACHABLE.to_string())
    }

    async fn latest_issued_at(&self, _email: &str) -> Result<Option<DateTime<Utc>>, String> {
        Err(UNREACHABLE.to_string())
    }

    async fn ping(&self) -> Result<(), String> {
        Err(UNREACHABLE.to_string())
    }
}

#[async_trait]
impl AttemptTracker for UnreachableStore {
    async fn record_failure(&self, _email: &str, _window: Duration) -> Result<u32, String> {
        Err(UNREACHABLE.to_string())
    }

    async fn clear_failures(&self, _email: &str) -> Result<(), String> {
        Err(UNREACHABLE.to_string())
    }

    async fn lock(&self, _email: &str, _duration: Duration) -> Result<(), String> {
        Err(UNREACHABLE.to_string())
    }

    async fn lock_remaining(&self, _email: &str) -> Result<Option<i64>, String> {
        Err(UNREACHABLE.to_string())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub mailer: Arc<RecordingMailTransport>,
    pub config: AppConfig,
}

pub fn context() -> TestContext {
    context_with(VerificationConfig::default(), RecordingMailTransport::default())
}

pub fn context_with(
    verification: VerificationConfig,
    mailer: RecordingMailTransport,
) -> TestContext {
    let store = Arc::new(MemoryStore::new(Duration::seconds(
        verification.expired_retention_seconds,
    )));
    let handles = StoreHandles {
        store: store.clone(),
        attempts: store,
    };
    context_from(verification, handles, mailer)
}

/// Context whose record store is unreachable
pub fn unreachable_context() -> TestContext {
    let store = Arc::new(UnreachableStore);
    let handles = StoreHandles {
        store: store.clone(),
        attempts: store,
    };
    context_from(
        VerificationConfig::default(),
        handles,
        RecordingMailTransport::default(),
    )
}

fn context_from(
    verification: VerificationConfig,
    handles: StoreHandles,
    mailer: RecordingMailTransport,
) -> TestContext {
    let mut config = AppConfig::for_environment(Environment::Development);
    config.verification = verification;

    let mailer = Arc::new(mailer);
    let state = web::Data::new(AppState::from_parts(
        handles,
        mailer.clone(),
        &config.verification,
    ));

    TestContext {
        state,
        mailer,
        config,
    }
}
