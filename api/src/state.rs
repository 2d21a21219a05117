//! Shared application state

use std::sync::Arc;

use sv_core::services::verification::{
    AttemptTracker, MailTransport, VerificationService, VerificationServiceConfig,
    VerificationStore,
};
use sv_infra::StoreHandles;
use sv_shared::VerificationConfig;

/// Verification service with the backend chosen at runtime
pub type DynVerificationService =
    VerificationService<dyn VerificationStore, dyn AttemptTracker, dyn MailTransport>;

/// Application state that holds shared services
#[derive(Clone)]
pub struct AppState {
    pub verification_service: Arc<DynVerificationService>,
}

impl AppState {
    pub fn new(verification_service: DynVerificationService) -> Self {
        Self {
            verification_service: Arc::new(verification_service),
        }
    }

    /// Wire the verification service from a store and a mail transport
    pub fn from_parts(
        handles: StoreHandles,
        mailer: Arc<dyn MailTransport>,
        config: &VerificationConfig,
    ) -> Self {
        Self::new(VerificationService::new(
            handles.store,
            handles.attempts,
            mailer,
            VerificationServiceConfig::from(config),
        ))
    }
}
