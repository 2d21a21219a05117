mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use sv_api::create_app;
use sv_shared::VerificationConfig;

use common::{context, context_with, unreachable_context, RecordingMailTransport};

const EMAIL: &str = "survivor@example.com";

#[actix_web::test]
async fn test_send_verification_emails_a_code() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::post()
        .uri("/send-verification")
        .set_json(json!({ "email": EMAIL }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Verification code sent to your email.");

    let mail = ctx.mailer.last_message().unwrap();
    assert_eq!(mail.to, EMAIL);
    assert_eq!(mail.subject, "Verify your SafeVoice email");
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[actix_web::test]
async fn test_send_verification_requires_email() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    for payload in [json!({}), json!({ "email": "   " }), json!({ "email": null })] {
        let req = test::TestRequest::post()
            .uri("/send-verification")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "missing_field");
        assert_eq!(body["message"], "Email required");
        assert!(body["timestamp"].is_string());
    }
    assert_eq!(ctx.mailer.sent_count(), 0);
}

#[actix_web::test]
async fn test_send_verification_rejects_malformed_email() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::post()
        .uri("/send-verification")
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_email");
    assert_eq!(body["message"], "Invalid email address");
    assert_eq!(ctx.mailer.sent_count(), 0);
}

#[actix_web::test]
async fn test_delivery_failure_returns_500_and_leaves_no_code() {
    let ctx = context_with(VerificationConfig::default(), RecordingMailTransport::failing());
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::post()
        .uri("/send-verification")
        .set_json(json!({ "email": EMAIL }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "delivery_failed");
    assert_eq!(body["message"], "Failed to send verification code");

    // The undelivered code was rolled back
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    let req = test::TestRequest::post()
        .uri("/verify-code")
        .set_json(json!({ "email": EMAIL, "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_code");
}

#[actix_web::test]
async fn test_resend_cooldown_returns_retry_after() {
    let verification = VerificationConfig {
        resend_cooldown_seconds: 60,
        ..Default::default()
    };
    let ctx = context_with(verification, RecordingMailTransport::default());
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let send = || {
        test::TestRequest::post()
            .uri("/send-verification")
            .set_json(json!({ "email": EMAIL }))
            .to_request()
    };

    let resp = test::call_service(&app, send()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, send()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: i64 = resp
        .headers()
        .get("Retry-After")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "resend_too_soon");
    assert_eq!(body["details"]["retry_after_seconds"], retry_after);
    assert_eq!(ctx.mailer.sent_count(), 1);
}

#[actix_web::test]
async fn test_malformed_json_is_invalid_request() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::post()
        .uri("/send-verification")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_request");
}

#[actix_web::test]
async fn test_health_and_unknown_route() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/does-not-exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_health_reports_unreachable_store() {
    let ctx = unreachable_context();
    let app = test::init_service(create_app(ctx.state.clone(), &ctx.config)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");

    // Store failures surface as internal errors, not as verification results
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/send-verification")
            .set_json(json!({ "email": EMAIL }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "internal_error");
}
