//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /` - gallery home page
//! - `POST /upload` - multipart image upload
//! - `GET /files` - JSON list of the caller's filenames
//! - `GET /files/{filename}` - HTML metadata page
//! - `GET /image/{filename}` - raw JPEG bytes
//! - `GET /generate/{filename}` - AI-generated description text
//! - `POST /delete/{filename}` - delete a file
//! - `GET|POST /signup`, `GET|POST /signin`, `GET /logout` - identity lifecycle
//! - `GET /health` - liveness check

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::caption::CaptionOracle;
use crate::error::{ApiError, CaptionError, StoreError, UserError};
use crate::meta::{parse_exif, ImageSummary};
use crate::store::{BlobStore, Visibility};
use crate::users::UserStore;

use super::pages::{self, GalleryEntry};
use super::session::{MaybeUser, SessionAuth, SessionUser};

/// Multipart field name carrying the uploaded file.
const UPLOAD_FIELD: &str = "form_file";

/// Content type recorded for uploads that do not declare one.
const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Suffix appended to a filename to form its description blob key.
const DESCRIPTION_SUFFIX: &str = "_description.txt";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to all handlers via Axum's State
/// extractor.
pub struct AppState<S: BlobStore, C: CaptionOracle> {
    /// The blob store holding uploaded images
    pub store: Arc<S>,

    /// Caption oracle; `None` disables generation
    pub oracle: Option<Arc<C>>,

    /// Account registry and file ownership
    pub users: Arc<dyn UserStore>,

    /// Session token authority
    pub sessions: SessionAuth,

    /// In-memory map of filename -> generated description (lost on restart)
    pub descriptions: Arc<RwLock<HashMap<String, String>>>,

    /// Whether uploads trigger caption generation
    pub caption_on_upload: bool,
}

impl<S: BlobStore, C: CaptionOracle> AppState<S, C> {
    /// Create state with captioning disabled.
    pub fn new(store: S, users: Arc<dyn UserStore>, sessions: SessionAuth) -> Self {
        Self {
            store: Arc::new(store),
            oracle: None,
            users,
            sessions,
            descriptions: Arc::new(RwLock::new(HashMap::new())),
            caption_on_upload: false,
        }
    }

    /// Attach a caption oracle.
    pub fn with_oracle(mut self, oracle: C) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    /// Enable or disable caption generation on upload.
    pub fn with_caption_on_upload(mut self, enabled: bool) -> Self {
        self.caption_on_upload = enabled;
        self
    }
}

impl<S: BlobStore, C: CaptionOracle> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            oracle: self.oracle.as_ref().map(Arc::clone),
            users: Arc::clone(&self.users),
            sessions: self.sessions.clone(),
            descriptions: Arc::clone(&self.descriptions),
            caption_on_upload: self.caption_on_upload,
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Form body for `POST /signup` and `POST /signin`.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    /// Account email
    pub email: String,

    /// Cleartext password (hashed before storage)
    pub password: String,
}

/// Query parameters for the sign-in page.
#[derive(Debug, Deserialize)]
pub struct SigninQueryParams {
    /// Present right after a successful signup
    #[serde(default)]
    pub registered: Option<u8>,
}

/// JSON error body returned for API-shaped error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error body.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to an HTTP response.
///
/// Authorization failures redirect browsers to the sign-in page; missing
/// resources and ownership violations surface as JSON errors; storage and
/// oracle failures are logged with their source and degrade to a generic
/// message with no structured detail.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unauthenticated => {
                debug!("unauthenticated request redirected to sign-in");
                return Redirect::to("/signin").into_response();
            }

            ApiError::Oracle(source) => {
                // Log the real failure; callers only see a generic message
                error!(source = %source, "caption generation failed");
                return (
                    StatusCode::BAD_GATEWAY,
                    "Error generating caption and description.",
                )
                    .into_response();
            }

            ApiError::Storage(source) => {
                error!(source = %source, "storage operation failed");
                let body = ErrorResponse::new("storage_error", "storage operation failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }

            _ => {}
        }

        let (status, error_type, message) = match &self {
            ApiError::Forbidden(name) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("You don't have access to {}", name),
            ),
            ApiError::NotFound(key) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("File {} does not exist", key),
            ),
            ApiError::DuplicateUser => (
                StatusCode::CONFLICT,
                "duplicate_user",
                "Email already exists".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            // Handled above
            ApiError::Unauthenticated | ApiError::Oracle(_) | ApiError::Storage(_) => {
                unreachable!()
            }
        };

        if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

// =============================================================================
// Gallery and Files
// =============================================================================

/// Handle the gallery home page.
///
/// Renders the session user's files with thumbnails and any recorded
/// descriptions.
pub async fn index_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
) -> Html<String> {
    let files = state.users.files(&user.email).await;

    let descriptions = state.descriptions.read().await;
    let entries: Vec<GalleryEntry> = files
        .into_iter()
        .map(|name| {
            let description = descriptions.get(&name).cloned();
            GalleryEntry { name, description }
        })
        .collect();
    drop(descriptions);

    Html(pages::render_index(&user.email, &entries))
}

/// Handle file listing.
///
/// # Endpoint
///
/// `GET /files`
///
/// Returns a JSON array of the session user's filenames in upload order.
/// Other users' files never appear here.
pub async fn list_files_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
) -> Json<Vec<String>> {
    Json(state.users.files(&user.email).await)
}

/// Handle the file metadata page.
///
/// # Endpoint
///
/// `GET /files/{filename}`
///
/// # Response
///
/// - `200 OK`: HTML page with basic properties and EXIF rows
/// - `303`: redirect to sign-in when unauthenticated
/// - `403 Forbidden`: file not owned by the caller
/// - `404 Not Found`: blob missing from the store
///
/// Metadata extraction is best-effort: undecodable bytes or absent EXIF
/// degrade to error rows rather than failing the page.
pub async fn file_details_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
    Path(filename): Path<String>,
) -> Result<Html<String>, ApiError> {
    // Existence before ownership: a deleted file is NotFound for everyone,
    // while an existing file someone else owns is Forbidden.
    if !state.store.exists(&filename).await? {
        return Err(ApiError::NotFound(filename));
    }
    if !state.users.owns(&user.email, &filename).await {
        return Err(ApiError::Forbidden(filename));
    }

    let bytes = state.store.get(&filename).await?;

    let summary = match ImageSummary::from_bytes(&bytes) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!(filename = %filename, "image summary unavailable: {}", e);
            None
        }
    };

    let exif = match parse_exif(&bytes) {
        Ok(fields) => Some(fields),
        Err(e) => {
            debug!(filename = %filename, "EXIF unavailable: {}", e);
            None
        }
    };

    let descriptions = state.descriptions.read().await;
    let description = descriptions.get(&filename).cloned();
    drop(descriptions);

    Ok(Html(pages::render_details(
        &filename,
        summary.as_ref(),
        exif.as_deref(),
        description.as_deref(),
    )))
}

/// Handle raw image retrieval.
///
/// # Endpoint
///
/// `GET /image/{filename}`
///
/// Streams back exactly the bytes that were uploaded, with
/// `Content-Type: image/jpeg`.
pub async fn image_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !state.store.exists(&filename).await? {
        return Err(ApiError::NotFound(filename));
    }
    if !state.users.owns(&user.email, &filename).await {
        return Err(ApiError::Forbidden(filename));
    }

    let bytes = state.store.get(&filename).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(axum::body::Body::from(bytes))
        .unwrap();

    Ok(response)
}

// =============================================================================
// Upload
// =============================================================================

/// Handle multipart uploads.
///
/// # Endpoint
///
/// `POST /upload`
///
/// Reads the `form_file` part and stores it under the literal client-supplied
/// filename. A request without a usable file part is a silent no-op. The blob
/// write completes before the filename is recorded against the user, so a
/// failed write never leaves a dangling reference.
///
/// With captioning-on-upload enabled, a description is generated and saved as
/// a public `{filename}_description.txt` companion blob; failures there are
/// logged and do not fail the upload.
pub async fn upload_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let Some((filename, content_type, bytes)) = read_file_part(multipart).await else {
        debug!("upload without a file part ignored");
        return Ok(Redirect::to("/"));
    };

    state
        .store
        .put(&filename, bytes.clone(), &content_type)
        .await
        .map_err(ApiError::from)?;

    if let Err(e) = state.store.set_visibility(&filename, Visibility::Private).await {
        warn!(filename = %filename, "could not mark upload private: {}", e);
    }

    state.users.record_file(&user.email, &filename).await?;

    if state.caption_on_upload {
        caption_upload(&state, &filename, &bytes).await;
    }

    Ok(Redirect::to("/"))
}

/// Pull the upload out of the multipart body.
///
/// Returns `None` when no `form_file` part with a filename is present, or
/// when the body cannot be read; the upload route treats both as a no-op.
async fn read_file_part(mut multipart: Multipart) -> Option<(String, String, Bytes)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                warn!("malformed multipart body: {}", e);
                return None;
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            // Browsers submit an empty part when no file is selected
            return None;
        }

        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE)
            .to_string();

        match field.bytes().await {
            Ok(bytes) => return Some((filename, content_type, bytes)),
            Err(e) => {
                warn!(filename = %filename, "failed to read upload body: {}", e);
                return None;
            }
        }
    }
}

/// Generate and persist a description for a fresh upload. Best-effort.
async fn caption_upload<S: BlobStore, C: CaptionOracle>(
    state: &AppState<S, C>,
    filename: &str,
    bytes: &[u8],
) {
    let Some(oracle) = state.oracle.as_ref() else {
        warn!("caption-on-upload enabled but no oracle configured");
        return;
    };

    let text = match oracle.describe(bytes).await {
        Ok(text) => text,
        Err(e) => {
            warn!(filename = %filename, "caption generation failed: {}", e);
            return;
        }
    };

    state
        .descriptions
        .write()
        .await
        .insert(filename.to_string(), text.clone());

    let companion_key = format!("{}{}", filename, DESCRIPTION_SUFFIX);
    match state
        .store
        .put(&companion_key, Bytes::from(text), "text/plain")
        .await
    {
        Ok(()) => {
            if let Err(e) = state
                .store
                .set_visibility(&companion_key, Visibility::Public)
                .await
            {
                warn!(key = %companion_key, "could not mark description public: {}", e);
            }
        }
        Err(e) => warn!(key = %companion_key, "could not save description: {}", e),
    }
}

// =============================================================================
// Caption Generation
// =============================================================================

/// Handle on-demand caption generation.
///
/// # Endpoint
///
/// `GET /generate/{filename}`
///
/// # Response
///
/// - `200 OK`: the oracle's text, verbatim, as `text/plain`
/// - `403 Forbidden`: file not owned by the caller
/// - `404 Not Found`: blob missing from the store
/// - `502 Bad Gateway`: generic failure message when the oracle fails or is
///   not configured; no retry is attempted
pub async fn generate_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
    Path(filename): Path<String>,
) -> Result<String, ApiError> {
    if !state.store.exists(&filename).await? {
        return Err(ApiError::NotFound(filename));
    }
    if !state.users.owns(&user.email, &filename).await {
        return Err(ApiError::Forbidden(filename));
    }

    let bytes = state.store.get(&filename).await?;

    let oracle = state.oracle.as_ref().ok_or(CaptionError::Disabled)?;
    let text = oracle.describe(&bytes).await?;

    state
        .descriptions
        .write()
        .await
        .insert(filename, text.clone());

    Ok(text)
}

// =============================================================================
// Deletion
// =============================================================================

/// Handle file deletion.
///
/// # Endpoint
///
/// `POST /delete/{filename}`
///
/// Removes the blob, then the ownership entry and any recorded description.
/// The two removals are not atomic with concurrent readers: a reader
/// mid-download may still complete against the deleted object.
pub async fn delete_handler<S: BlobStore, C: CaptionOracle>(
    user: SessionUser,
    State(state): State<AppState<S, C>>,
    Path(filename): Path<String>,
) -> Result<Redirect, ApiError> {
    if !state.users.owns(&user.email, &filename).await {
        return Err(ApiError::Forbidden(filename));
    }

    // An already-gone blob must not leave a dangling listing entry
    match state.store.delete(&filename).await {
        Ok(()) | Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    state.users.forget_file(&user.email, &filename).await;
    state.descriptions.write().await.remove(&filename);

    Ok(Redirect::to("/"))
}

// =============================================================================
// Identity
// =============================================================================

/// Serve the sign-up page.
pub async fn signup_page_handler() -> Html<String> {
    Html(pages::render_signup(None))
}

/// Handle account creation.
///
/// # Endpoint
///
/// `POST /signup`
///
/// On success redirects to the sign-in page. A duplicate email re-renders
/// the form with a message and leaves the existing account untouched.
pub async fn signup_handler<S: BlobStore, C: CaptionOracle>(
    State(state): State<AppState<S, C>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        let page = pages::render_signup(Some("Email and password are required"));
        return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
    }

    match state.users.create(email, &form.password).await {
        Ok(()) => Ok(Redirect::to("/signin?registered=1").into_response()),
        Err(UserError::DuplicateUser(_)) => {
            debug!(email = %email, "signup with existing email");
            let page = pages::render_signup(Some("Email already exists"));
            Ok((StatusCode::CONFLICT, Html(page)).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

/// Serve the sign-in page.
///
/// Already-authenticated visitors are sent straight to the gallery.
pub async fn signin_page_handler<S: BlobStore, C: CaptionOracle>(
    user: MaybeUser,
    State(_state): State<AppState<S, C>>,
    Query(query): Query<SigninQueryParams>,
) -> Response {
    if user.0.is_some() {
        return Redirect::to("/").into_response();
    }

    let notice = query
        .registered
        .map(|_| "Sign-up successful! You can now sign in.");
    Html(pages::render_signin(None, notice)).into_response()
}

/// Handle sign-in.
///
/// # Endpoint
///
/// `POST /signin`
///
/// On success sets the session cookie and redirects to the gallery. Unknown
/// email and wrong password are indistinguishable to the caller, and neither
/// creates a session.
pub async fn signin_handler<S: BlobStore, C: CaptionOracle>(
    State(state): State<AppState<S, C>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let email = form.email.trim();

    match state.users.verify_credentials(email, &form.password).await {
        Ok(()) => {
            let token = state.sessions.issue(email);
            let cookie = state.sessions.cookie(&token);
            Ok((
                [(header::SET_COOKIE, cookie)],
                Redirect::to("/"),
            )
                .into_response())
        }
        Err(UserError::InvalidCredentials) => {
            debug!(email = %email, "sign-in rejected");
            let page = pages::render_signin(Some("Invalid credentials"), None);
            Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

/// Handle sign-out: clears the cookie unconditionally.
pub async fn logout_handler() -> Response {
    (
        [(header::SET_COOKIE, SessionAuth::clear_cookie())],
        Redirect::to("/signin"),
    )
        .into_response()
}

// =============================================================================
// Health
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
