//! Test utilities for integration tests.
//!
//! Provides in-process implementations of the blob store and caption oracle
//! seams, plus helpers for driving the router: form posts, multipart upload
//! bodies, session cookies, and JPEG fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::sync::RwLock;
use tower::ServiceExt;

use photobin::error::{CaptionError, StoreError, UserError};
use photobin::{
    create_router, AppState, BlobStore, CaptionOracle, IdentityVerifier, MemoryUserStore,
    SessionAuth, Visibility,
};

// =============================================================================
// Mock Blob Store
// =============================================================================

/// A stored object with its metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
    pub visibility: Visibility,
}

/// In-memory blob store with failure injection.
///
/// Clones share the same underlying map, so tests can keep a handle for
/// assertions while the router owns another.
#[derive(Clone, Default)]
pub struct MockBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    fail_puts: Arc<AtomicBool>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail with a backend error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Remove an object out-of-band, simulating external deletion.
    pub async fn remove(&self, key: &str) {
        self.objects.write().await.remove(key);
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected put failure".to_string()));
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                visibility: Visibility::Private,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list_suffix(&self, suffixes: &[&str]) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| {
                let lower = k.to_lowercase();
                suffixes.iter().any(|s| lower.ends_with(s))
            })
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn set_visibility(&self, key: &str, visibility: Visibility) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        match objects.get_mut(key) {
            Some(object) => {
                object.visibility = visibility;
                Ok(())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }
}

// =============================================================================
// Mock Caption Oracle
// =============================================================================

/// Caption oracle returning a fixed answer or a fixed failure.
#[derive(Clone)]
pub struct MockOracle {
    response: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockOracle {
    /// Oracle that always answers with `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Oracle that always fails.
    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptionOracle for MockOracle {
    async fn describe(&self, _image: &[u8]) -> Result<String, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(CaptionError::Api {
                status: 500,
                body: "injected oracle failure".to_string(),
            }),
        }
    }
}

// =============================================================================
// Application Harness
// =============================================================================

/// Password verifier that stores cleartext, keeping signup fast in tests.
struct PlainVerifier;

impl IdentityVerifier for PlainVerifier {
    fn hash(&self, password: &str) -> Result<String, UserError> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        password == stored_hash
    }
}

pub const TEST_SESSION_SECRET: &str = "integration-test-secret";

/// A router plus handles onto its collaborators for assertions.
pub struct TestApp {
    pub router: Router,
    pub store: MockBlobStore,
    pub oracle: Option<MockOracle>,
}

/// Build an app without a caption oracle.
pub fn test_app() -> TestApp {
    build_app(None, false)
}

/// Build an app with the given oracle.
pub fn test_app_with_oracle(oracle: MockOracle, caption_on_upload: bool) -> TestApp {
    build_app(Some(oracle), caption_on_upload)
}

fn build_app(oracle: Option<MockOracle>, caption_on_upload: bool) -> TestApp {
    let store = MockBlobStore::new();
    let users = Arc::new(MemoryUserStore::new(Box::new(PlainVerifier)));
    let sessions = SessionAuth::new(TEST_SESSION_SECRET, Duration::from_secs(3600));

    let mut state: AppState<MockBlobStore, MockOracle> =
        AppState::new(store.clone(), users, sessions).with_caption_on_upload(caption_on_upload);

    if let Some(ref oracle) = oracle {
        state = state.with_oracle(oracle.clone());
    }

    TestApp {
        router: create_router(state, false),
        store,
        oracle,
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn get_with_cookie(router: &Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn post_with_cookie(router: &Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

/// POST a urlencoded form body.
pub async fn post_form(router: &Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

/// Extract the session cookie pair ("session=...") from a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(|s| s.trim().to_string())
}

/// Sign up and sign in, returning the session cookie.
pub async fn signup_and_signin(router: &Router, email: &str, password: &str) -> String {
    let body = format!("email={}&password={}", email, password);

    let response = post_form(router, "/signup", &body).await;
    assert_eq!(
        response.status(),
        StatusCode::SEE_OTHER,
        "signup should redirect"
    );

    let response = post_form(router, "/signin", &body).await;
    assert_eq!(
        response.status(),
        StatusCode::SEE_OTHER,
        "signin should redirect"
    );

    session_cookie(&response).expect("signin should set a session cookie")
}

// =============================================================================
// Multipart Upload Helpers
// =============================================================================

pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a multipart/form-data body with a single file part.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build a multipart body with only a text field (no file part).
pub fn multipart_body_without_file() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
    body.extend_from_slice(b"hello");
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST a multipart upload with the session cookie.
pub async fn upload(
    router: &Router,
    cookie: &str,
    filename: &str,
    data: &[u8],
) -> Response<Body> {
    upload_body(
        router,
        cookie,
        multipart_body("form_file", filename, "image/jpeg", data),
    )
    .await
}

pub async fn upload_body(router: &Router, cookie: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

// =============================================================================
// JPEG Fixtures
// =============================================================================

/// A decodable JPEG encoded in memory.
pub fn tiny_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 12, image::Rgb([200, 100, 50]));
    let mut bytes = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut bytes);
    encoder
        .encode(img.as_raw(), 16, 12, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// A JPEG shell carrying an EXIF APP1 segment with Make = "Canon" and
/// Orientation = 6. Not decodable as image data; metadata parsing only.
pub fn jpeg_with_exif() -> Vec<u8> {
    // Little-endian TIFF body, IFD0 at offset 8 with two entries
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());

    // Make, Ascii, count 6, value at offset (8 + 2 + 24 + 4 = 38)
    tiff.extend_from_slice(&0x010Fu16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&6u32.to_le_bytes());
    tiff.extend_from_slice(&38u32.to_le_bytes());

    // Orientation, Short, count 1, inline value 6
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&[6, 0, 0, 0]);

    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
    tiff.extend_from_slice(b"Canon\0");

    let mut payload = Vec::new();
    payload.extend_from_slice(b"Exif\0\0");
    payload.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
