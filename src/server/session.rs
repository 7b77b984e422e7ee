//! Cookie session authentication.
//!
//! A session is an HMAC-SHA256 signed token carried in an `HttpOnly` cookie:
//!
//! ```text
//! token = base64url(email) . expiry . hex(HMAC-SHA256(secret, email \n expiry))
//! ```
//!
//! The server holds no per-session state; the token itself is the session.
//! Verification is constant-time and checks expiry first. A verified token
//! is only as good as the account behind it, so the route guard additionally
//! checks that the email still exists in the user store.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::caption::CaptionOracle;
use crate::error::{ApiError, SessionError};
use crate::store::BlobStore;

use super::handlers::AppState;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

// =============================================================================
// Session Tokens
// =============================================================================

/// Issues and verifies signed session tokens.
#[derive(Clone)]
pub struct SessionAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// How long issued sessions stay valid
    ttl: Duration,
}

impl SessionAuth {
    /// Create an authenticator with the given secret key and session TTL.
    ///
    /// The key should be at least 16 bytes; `Config::validate` enforces this
    /// at startup.
    pub fn new(secret_key: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            ttl,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `email`, valid for the configured TTL.
    pub fn issue(&self, email: &str) -> String {
        let expiry = unix_now() + self.ttl.as_secs();
        self.issue_with_expiry(email, expiry)
    }

    /// Issue a token with a specific expiry timestamp (Unix epoch seconds).
    pub fn issue_with_expiry(&self, email: &str, expiry: u64) -> String {
        let signature = self.compute_signature(email, expiry);
        format!("{}.{}.{}", URL_SAFE_NO_PAD.encode(email), expiry, signature)
    }

    /// Verify a token and return the email it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        let mut parts = token.splitn(3, '.');
        let (email_b64, expiry_str, signature) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(e), Some(x), Some(s)) => (e, x, s),
                _ => return Err(SessionError::Malformed),
            };

        let email_bytes = URL_SAFE_NO_PAD
            .decode(email_b64)
            .map_err(|_| SessionError::Malformed)?;
        let email = String::from_utf8(email_bytes).map_err(|_| SessionError::Malformed)?;
        let expiry: u64 = expiry_str.parse().map_err(|_| SessionError::Malformed)?;

        let now = unix_now();
        if now > expiry {
            return Err(SessionError::Expired {
                expired_at: expiry,
                now,
            });
        }

        let provided_sig = hex::decode(signature).map_err(|_| SessionError::Malformed)?;
        let expected_sig = hex::decode(self.compute_signature(&email, expiry))
            .map_err(|_| SessionError::Malformed)?;

        // Constant-time comparison
        if provided_sig.ct_eq(&expected_sig).into() {
            Ok(email)
        } else {
            Err(SessionError::InvalidSignature)
        }
    }

    /// Build the `Set-Cookie` value establishing a session.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.as_secs()
        )
    }

    /// Build the `Set-Cookie` value clearing the session.
    pub fn clear_cookie() -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }

    /// Compute the hex-encoded HMAC-SHA256 signature for a token body.
    fn compute_signature(&self, email: &str, expiry: u64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(email.as_bytes());
        mac.update(b"\n");
        mac.update(expiry.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}

/// Pull the session token out of the request's Cookie headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = value.to_str() else {
            continue;
        };
        for cookie in cookies.split(';') {
            let cookie = cookie.trim();
            if let Some(token) = cookie.strip_prefix(SESSION_COOKIE) {
                if let Some(token) = token.strip_prefix('=') {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

// =============================================================================
// Extractors
// =============================================================================

/// Route guard: the authenticated user for this request.
///
/// Rejects with [`ApiError::Unauthenticated`] (a redirect to `/signin`) when
/// the cookie is missing, invalid, expired, or names an account that no
/// longer exists.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// Email of the authenticated account
    pub email: String,
}

impl<S, C> FromRequestParts<AppState<S, C>> for SessionUser
where
    S: BlobStore + 'static,
    C: CaptionOracle + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, C>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;

        let email = state.sessions.verify(&token).map_err(|e| {
            debug!("session rejected: {}", e);
            ApiError::Unauthenticated
        })?;

        if !state.users.exists(&email).await {
            debug!("session for unknown account: {}", email);
            return Err(ApiError::Unauthenticated);
        }

        Ok(SessionUser { email })
    }
}

/// Non-rejecting variant of [`SessionUser`] for pages that merely adapt to
/// signed-in visitors (e.g. `/signin` redirecting home).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<String>);

impl<S, C> FromRequestParts<AppState<S, C>> for MaybeUser
where
    S: BlobStore + 'static,
    C: CaptionOracle + 'static,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, C>,
    ) -> Result<Self, Self::Rejection> {
        let mut email = None;
        if let Some(token) = session_token(&parts.headers) {
            if let Ok(verified) = state.sessions.verify(&token) {
                if state.users.exists(&verified).await {
                    email = Some(verified);
                }
            }
        }

        Ok(MaybeUser(email))
    }
}

// =============================================================================
// Tests
// =============================================================================
