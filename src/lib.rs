//! # Photobin
//!
//! A small web gallery for JPEG images stored in S3-compatible object
//! storage. Signed-up users upload images, browse their own files, inspect
//! metadata (dimensions, color mode, EXIF tags), and request AI-generated
//! descriptions from an external caption service.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`] - blob store trait and the S3 implementation
//! - [`users`] - account registry, file ownership, password hashing
//! - [`caption`] - caption oracle trait and the Gemini implementation
//! - [`meta`] - image summary and native EXIF parsing
//! - [`server`] - Axum handlers, sessions, pages, and routes
//! - [`config`] - CLI and environment configuration
//! - [`error`] - the crate-wide error taxonomy
//!
//! External collaborators sit behind seam traits ([`BlobStore`],
//! [`CaptionOracle`], [`UserStore`]) so handlers can be exercised against
//! in-process fakes; see the integration tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use photobin::{
//!     create_router, create_s3_client, AppState, GeminiCaptioner, MemoryUserStore,
//!     S3BlobStore, SessionAuth,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let store = S3BlobStore::new(client, "my-photos".to_string());
//!     let users = Arc::new(MemoryUserStore::default());
//!     let sessions = SessionAuth::new("a-secret-of-16-bytes-or-more", Duration::from_secs(86_400));
//!
//!     let state: AppState<S3BlobStore, GeminiCaptioner> =
//!         AppState::new(store, users, sessions);
//!     let router = create_router(state, true);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod caption;
pub mod config;
pub mod error;
pub mod meta;
pub mod server;
pub mod store;
pub mod users;

// Re-export commonly used types
pub use caption::{CaptionOracle, GeminiCaptioner};
pub use config::Config;
pub use error::{ApiError, CaptionError, MetaError, SessionError, StoreError, UserError};
pub use meta::{is_jpeg_name, parse_exif, ExifField, ImageSummary, JPEG_SUFFIXES};
pub use server::{
    create_router, html_escape, AppState, ErrorResponse, GalleryEntry, HealthResponse,
    MaybeUser, SessionAuth, SessionUser, MAX_UPLOAD_BYTES, SESSION_COOKIE,
};
pub use store::{create_s3_client, BlobStore, S3BlobStore, Visibility};
pub use users::{Argon2Verifier, IdentityVerifier, MemoryUserStore, User, UserStore};
