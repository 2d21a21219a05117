//! Verification email content

/// Subject line of the verification email
pub const EMAIL_SUBJECT: &str = "Verify your SafeVoice email";

/// HTML body carrying the code and its expiry notice
pub fn render_html_body(code: &str, ttl_seconds: i64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 480px; margin: 0 auto;">
  <h2>SafeVoice email verification</h2>
  <p>Use the code below to verify your email address:</p>
  <p class="verification-code" style="font-size: 28px; font-weight: bold; letter-spacing: 4px;">{code}</p>
  <p>This code will expire in {expiry}.</p>
  <p>If you did not request this code, you can ignore this email.</p>
</div>"#,
        code = code,
        expiry = describe_duration(ttl_seconds),
    )
}

/// Human readable duration, e.g. "2 minutes"
fn describe_duration(seconds: i64) -> String {
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    if seconds >= 3600 && seconds % 3600 == 0 {
        plural(seconds / 3600, "hour")
    } else if seconds >= 60 && seconds % 60 == 0 {
        plural(seconds / 60, "minute")
    } else {
        plural(seconds.max(0), "second")
    }
}
