use thiserror::Error;

/// Errors from the blob store backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No object exists under the requested key
    #[error("object not found: {0}")]
    NotFound(String),

    /// Error reported by S3 or an S3-compatible backend
    #[error("storage error: {0}")]
    Backend(String),

    /// Network or connection error while talking to the backend
    #[error("connection error: {0}")]
    Connection(String),
}

/// Errors from the caption oracle.
#[derive(Debug, Error)]
pub enum CaptionError {
    /// No oracle is configured (missing API key)
    #[error("caption generation is not configured")]
    Disabled,

    /// The HTTP request to the oracle failed before a response arrived
    #[error("caption request failed: {0}")]
    Http(String),

    /// The oracle returned a non-success status
    #[error("caption service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The oracle responded, but without any usable text
    #[error("caption service response contained no text")]
    MalformedResponse,
}

/// Errors while extracting metadata from image bytes.
///
/// These never fail a request on their own; the metadata page degrades to an
/// error row instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    /// The bytes could not be decoded as an image
    #[error("undecodable image: {0}")]
    Undecodable(String),

    /// The image carries no EXIF segment
    #[error("no EXIF data present")]
    NoExif,

    /// The EXIF segment exists but its TIFF structure is malformed
    #[error("malformed EXIF data: {0}")]
    MalformedExif(&'static str),
}

/// Errors from the user store.
#[derive(Debug, Error)]
pub enum UserError {
    /// The email is already registered
    #[error("account already exists: {0}")]
    DuplicateUser(String),

    /// Unknown email or password mismatch
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed (should not happen with valid parameters)
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Errors while verifying a session token.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Token does not have the expected shape
    #[error("malformed session token")]
    Malformed,

    /// Token expired
    #[error("session expired at {expired_at} (current time: {now})")]
    Expired { expired_at: u64, now: u64 },

    /// Signature does not match
    #[error("invalid session signature")]
    InvalidSignature,
}

/// Handler-level error type, mapped onto HTTP responses in the server layer.
///
/// Authorization and not-found failures carry enough detail to render; storage
/// and oracle failures keep their source for logging but degrade to a generic
/// message on the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session on a guarded route
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the file is not in the caller's ownership list
    #[error("not the owner of {0}")]
    Forbidden(String),

    /// The blob store has no such key
    #[error("no such file: {0}")]
    NotFound(String),

    /// Signup with an already-registered email
    #[error("email already registered")]
    DuplicateUser,

    /// Signin with an unknown email or wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Caption generation failed
    #[error("caption generation failed")]
    Oracle(#[source] CaptionError),

    /// Blob store I/O failed
    #[error("storage operation failed")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(key),
            other => ApiError::Storage(other),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateUser(_) => ApiError::DuplicateUser,
            UserError::InvalidCredentials => ApiError::InvalidCredentials,
            // Hashing failure is infrastructure trouble, not a credential
            // problem; surface it like any backend failure.
            UserError::Hashing(msg) => ApiError::Storage(StoreError::Backend(msg)),
        }
    }
}

impl From<CaptionError> for ApiError {
    fn from(err: CaptionError) -> Self {
        ApiError::Oracle(err)
    }
}
