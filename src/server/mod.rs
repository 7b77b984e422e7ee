//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           HTTP Layer                             │
//! │      GET /  /files  /files/{f}  /image/{f}  /generate/{f}        │
//! │      POST /upload  /delete/{f}  /signup  /signin                 │
//! │                                                                  │
//! │  ┌────────────┐  ┌─────────────┐  ┌────────┐  ┌──────────────┐  │
//! │  │  handlers  │  │   session   │  │ pages  │  │    routes    │  │
//! │  │ (requests) │  │  (cookies)  │  │ (HTML) │  │   (router)   │  │
//! │  └────────────┘  └─────────────┘  └────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod pages;
pub mod routes;
pub mod session;

pub use handlers::{
    delete_handler, file_details_handler, generate_handler, health_handler, image_handler,
    index_handler, list_files_handler, logout_handler, signin_handler, signup_handler,
    upload_handler, AppState, CredentialsForm, ErrorResponse, HealthResponse, SigninQueryParams,
};
pub use pages::{html_escape, GalleryEntry};
pub use routes::{create_router, MAX_UPLOAD_BYTES};
pub use session::{session_token, MaybeUser, SessionAuth, SessionUser, SESSION_COOKIE};
