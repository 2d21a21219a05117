//! Verification code generation and comparison

use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};

use crate::domain::entities::verification_record::CODE_ALPHABET;

/// Generate a code of `length` symbols drawn uniformly from the code alphabet
///
/// Uses OsRng (OS-provided CSPRNG); `gen_range` rejects out-of-range samples,
/// so no symbol is favoured.
pub fn generate_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Compare a stored code with a submitted one in constant time
pub fn codes_match(stored: &str, provided: &str) -> bool {
    if stored.len() != provided.len() {
        return false;
    }
    constant_time_eq(stored.as_bytes(), provided.as_bytes())
}
