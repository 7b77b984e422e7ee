//! File retrieval, metadata, and deletion tests.

use axum::http::{header, StatusCode};

use super::test_utils::{
    body_bytes, body_string, get, get_with_cookie, post_with_cookie, signup_and_signin, test_app,
    jpeg_with_exif, tiny_jpeg, upload,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

// =============================================================================
// Image Retrieval
// =============================================================================

#[tokio::test]
async fn test_upload_then_image_roundtrip_is_byte_identical() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let original = tiny_jpeg();
    let response = upload(&app.router, &cookie, "cat.jpg", &original).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = get_with_cookie(&app.router, "/image/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let served = body_bytes(response).await;
    assert_eq!(served.as_ref(), original.as_slice());
}

#[tokio::test]
async fn test_image_not_found() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let response = get_with_cookie(&app.router, "/image/ghost.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "not_found");
}

// =============================================================================
// Metadata Page
// =============================================================================

#[tokio::test]
async fn test_details_page_shows_decoded_properties() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    let response = get_with_cookie(&app.router, "/files/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("cat.jpg"));
    assert!(body.contains("(16, 12)"));
    assert!(body.contains("JPEG"));
    assert!(body.contains("RGB"));
    // The fixture carries no EXIF segment
    assert!(body.contains("EXIF data not available"));
}

#[tokio::test]
async fn test_details_page_shows_exif_rows() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "exif.jpg", &jpeg_with_exif()).await;

    let response = get_with_cookie(&app.router, "/files/exif.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("<td>Make</td><td>Canon</td>"));
    assert!(body.contains("<td>Orientation</td><td>6</td>"));
    // The EXIF shell has no scan data, so decoding degrades to an error row
    assert!(body.contains("could not be decoded"));
}

#[tokio::test]
async fn test_details_page_not_found() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    let response = get_with_cookie(&app.router, "/files/ghost.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_details_page_after_external_deletion() {
    // A file can vanish from the store while still in the ownership list;
    // the page must report NotFound, not an internal error
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    app.store.remove("cat.jpg").await;

    let response = get_with_cookie(&app.router, "/files/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_removes_blob_and_listing_entry() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    assert!(app.store.contains("cat.jpg").await);

    let response = post_with_cookie(&app.router, "/delete/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    // Gone from the store
    assert!(!app.store.contains("cat.jpg").await);

    // Gone from the listing
    let response = get_with_cookie(&app.router, "/files", &cookie).await;
    let listing: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(listing.is_empty());

    // Requesting it now yields NotFound
    let response = get_with_cookie(&app.router, "/image/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_with_cookie(&app.router, "/files/cat.jpg", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_only_affects_named_file() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;
    upload(&app.router, &cookie, "dog.jpg", &tiny_jpeg()).await;

    post_with_cookie(&app.router, "/delete/cat.jpg", &cookie).await;

    let response = get_with_cookie(&app.router, "/files", &cookie).await;
    let listing: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(listing, vec!["dog.jpg"]);
    assert!(app.store.contains("dog.jpg").await);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_files_listing_preserves_upload_order() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    for name in ["z.jpg", "a.jpg", "m.jpg"] {
        upload(&app.router, &cookie, name, &tiny_jpeg()).await;
    }

    let response = get_with_cookie(&app.router, "/files", &cookie).await;
    let listing: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(listing, vec!["z.jpg", "a.jpg", "m.jpg"]);
}

#[tokio::test]
async fn test_gallery_renders_upload_form_and_thumbnails() {
    let app = test_app();
    let cookie = signup_and_signin(&app.router, "a@x.com", "pw").await;

    upload(&app.router, &cookie, "cat.jpg", &tiny_jpeg()).await;

    let body = body_string(get_with_cookie(&app.router, "/", &cookie).await).await;
    assert!(body.contains("form_file"));
    assert!(body.contains(r#"<img src="/image/cat.jpg""#));
    assert!(body.contains("a@x.com"));
}
