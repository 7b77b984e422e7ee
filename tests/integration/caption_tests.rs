//! Caption generation tests: on-demand `/generate`, caption-on-upload, and
//! degraded behavior when the oracle fails or is absent.

use axum::http::StatusCode;

use photobin::Visibility;

use super::test_utils::{
    body_string, get_with_cookie, signup_and_signin, test_app, test_app_with_oracle, tiny_jpeg,
    upload, MockOracle,
};

#[tokio::test]
async fn test_generate_returns_oracle_text_verbatim() {
    let app = test_app_with_oracle(MockOracle::fixed("A ginger cat on a sofa."), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    let response = get_with_cookie(&app.router, "/generate/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert_eq!(body, "A ginger cat on a sofa.");
    assert_eq!(app.oracle.as_ref().unwrap().call_count(), 1);
}

#[tokio::test]
async fn test_generate_records_description_for_gallery() {
    let app = test_app_with_oracle(MockOracle::fixed("A ginger cat."), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    get_with_cookie(&app.router, "/generate/cat.jpg", &cookie).await;

    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(body.contains("A ginger cat."));

    let body = body_string(get_with_cookie(&app.router, "/files/cat.jpg", &cookie).await).await;
    assert!(body.contains("A ginger cat."));
}

#[tokio::test]
async fn test_generate_missing_file_is_not_found() {
    let app = test_app_with_oracle(MockOracle::fixed("unused"), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let response = get_with_cookie(&app.router, "/generate/ghost.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.oracle.as_ref().unwrap().call_count(), 0);
}

#[tokio::test]
async fn test_generate_cross_user_is_forbidden() {
    let app = test_app_with_oracle(MockOracle::fixed("unused"), false);
    let cookie_a = signup_and_signin(&app.router, "a@x.com", "pw").await;
    let cookie_b = signup_and_signin(&app.router, "b@x.com", "pw").await;

    upload(&app.router, &cookie_a, "cat.jpg", &tiny_jpeg()).await;

    let response = get_with_cookie(&app.router, "/generate/cat.jpg", &cookie_b).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.oracle.as_ref().unwrap().call_count(), 0);
}

#[tokio::test]
async fn test_generate_without_oracle_degrades_to_generic_message() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    let response = get_with_cookie(&app.router, "/generate/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_string(response).await;
    assert_eq!(body, "Error generating caption and description.");
}

#[tokio::test]
async fn test_generate_oracle_failure_degrades_without_detail() {
    let app = test_app_with_oracle(MockOracle::failing(), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    let response = get_with_cookie(&app.router, "/generate/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The oracle's internal error never reaches the caller
    let body = body_string(response).await;
    assert!(!body.contains("injected"));

    // No description was recorded
    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(!body.contains("injected"));
}

// =============================================================================
// Caption on Upload
// =============================================================================

#[tokio::test]
async fn test_caption_on_upload_persists_companion_blob() {
    let app = test_app_with_oracle(MockOracle::fixed("A tiny test image."), true);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let response = upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.oracle.as_ref().unwrap().call_count(), 1);

    // The image stays private; the description companion is public text
    let image = app.store.object("cat.jpg").await.unwrap();
    assert_eq!(image.visibility, Visibility::Private);

    let companion = app.store.object("cat.jpg_description.txt").await.unwrap();
    assert_eq!(companion.bytes.as_ref(), b"A tiny test image.");
    assert_eq!(companion.content_type, "text/plain");
    assert_eq!(companion.visibility, Visibility::Public);

    // And the gallery shows it immediately
    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(body.contains("A tiny test image."));
}

#[tokio::test]
async fn test_caption_failure_does_not_fail_upload() {
    let app = test_app_with_oracle(MockOracle::failing(), true);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let response = upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The image landed and is listed
    assert!(app.store.contains("cat.jpg").await);
    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(body.contains("cat.jpg"));

    // No companion blob was written
    assert!(!app.store.contains("cat.jpg_description.txt").await);
}

#[tokio::test]
async fn test_upload_without_caption_flag_does_not_call_oracle() {
    let app = test_app_with_oracle(MockOracle::fixed("unused"), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    assert_eq!(app.oracle.as_ref().unwrap().call_count(), 0);
    assert!(!app.store.contains("cat.jpg_description.txt").await);
}

#[tokio::test]
async fn test_delete_drops_recorded_description() {
    let app = test_app_with_oracle(MockOracle::fixed("A ginger cat."), false);
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    get_with_cookie(&app.router, "/generate/cat.jpg", &cookie).await;

    super::test_utils::post_with_cookie(&app.router, "/delete/cat.jpg", &cookie).await;

    // Re-upload the same name: the stale description must not reappear
    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(!body.contains("A ginger cat."));
}
