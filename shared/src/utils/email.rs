//! Email address helpers

/// Trim surrounding whitespace from a submitted address
///
/// Addresses are otherwise kept as submitted; matching against stored
/// records is exact.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Mask an email address for logs (e.g., j***@example.com)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            if first.is_empty() {
                format!("***@{}", domain)
            } else {
                format!("{}***@{}", first, domain)
            }
        }
        None => "***".to_string(),
    }
}
