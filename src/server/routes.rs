//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /                      - gallery home page (session)
//! /upload                - multipart upload (session)
//! /files                 - JSON list of own files (session)
//! /files/{filename}      - metadata page (session + ownership)
//! /image/{filename}      - raw JPEG bytes (session + ownership)
//! /generate/{filename}   - caption text (session + ownership)
//! /delete/{filename}     - delete file (session + ownership)
//! /signup /signin /logout - identity lifecycle (public)
//! /health                - health check (public)
//! ```
//!
//! Session enforcement happens in the [`SessionUser`] extractor rather than
//! a middleware layer, so public and guarded routes live in one router.
//!
//! [`SessionUser`]: super::session::SessionUser

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::caption::CaptionOracle;
use crate::store::BlobStore;

use super::handlers::{
    delete_handler, file_details_handler, generate_handler, health_handler, image_handler,
    index_handler, list_files_handler, logout_handler, signin_handler, signin_page_handler,
    signup_handler, signup_page_handler, upload_handler, AppState,
};

/// Maximum accepted request body size (32 MiB).
///
/// Axum's default of 2 MiB is too small for camera JPEGs; the application
/// itself performs no size validation beyond this transport cap.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Create the main application router.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `enable_tracing` - Attach a `TraceLayer` for per-request logging
pub fn create_router<S, C>(state: AppState<S, C>, enable_tracing: bool) -> Router
where
    S: BlobStore + 'static,
    C: CaptionOracle + 'static,
{
    let router = Router::new()
        .route("/", get(index_handler::<S, C>))
        .route("/upload", post(upload_handler::<S, C>))
        .route("/files", get(list_files_handler::<S, C>))
        .route("/files/{filename}", get(file_details_handler::<S, C>))
        .route("/image/{filename}", get(image_handler::<S, C>))
        .route("/generate/{filename}", get(generate_handler::<S, C>))
        .route("/delete/{filename}", post(delete_handler::<S, C>))
        .route(
            "/signup",
            get(signup_page_handler).post(signup_handler::<S, C>),
        )
        .route(
            "/signin",
            get(signin_page_handler::<S, C>).post(signin_handler::<S, C>),
        )
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    if enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
