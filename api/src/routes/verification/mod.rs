//! Email verification route handlers
//!
//! - `POST /send-verification` issues a code and emails it
//! - `POST /verify-code` validates a submitted code

pub mod send_verification;
pub mod verify_code;

pub use send_verification::send_verification;
pub use verify_code::verify_code;
