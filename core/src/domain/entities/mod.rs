//! Domain entities representing core business objects.

pub mod verification_record;

// Re-export commonly used types
pub use verification_record::{
    VerificationRecord, CODE_ALPHABET, CODE_LENGTH, DEFAULT_CODE_TTL_SECONDS,
};
