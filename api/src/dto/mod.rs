pub mod verification;

pub use verification::{SendVerificationRequest, VerifyCodeRequest, VerifyCodeResponse};
