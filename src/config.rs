//! Configuration for the photobin server.
//!
//! All options can be supplied on the command line or through environment
//! variables with the `PHOTOBIN_` prefix:
//!
//! - `PHOTOBIN_HOST` - Server bind address (default: 0.0.0.0)
//! - `PHOTOBIN_PORT` - Server port (default: 8080)
//! - `PHOTOBIN_S3_BUCKET` - S3 bucket holding uploaded images (required)
//! - `PHOTOBIN_S3_ENDPOINT` - Custom endpoint for S3-compatible services
//! - `PHOTOBIN_S3_REGION` - AWS region (default: us-east-1)
//! - `PHOTOBIN_SESSION_SECRET` - HMAC secret for session cookies (required)
//! - `PHOTOBIN_SESSION_TTL` - Session lifetime in seconds (default: 86400)
//! - `PHOTOBIN_GEMINI_API_KEY` - API key for the caption service (optional)
//! - `PHOTOBIN_GEMINI_MODEL` - Caption model name (default: gemini-1.5-flash)
//! - `PHOTOBIN_CAPTION_ON_UPLOAD` - Describe every upload (default: false)

use clap::Parser;

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default session lifetime in seconds (24 hours).
pub const DEFAULT_SESSION_TTL: u64 = 86_400;

/// Default caption model.
pub const DEFAULT_CAPTION_MODEL: &str = "gemini-1.5-flash";

/// Photobin - a web gallery for JPEG images stored in S3.
///
/// Signed-up users upload images to an S3 bucket, browse their own files,
/// inspect EXIF metadata, and optionally request AI-generated descriptions.
#[derive(Parser, Debug, Clone)]
#[command(name = "photobin")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PHOTOBIN_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PHOTOBIN_PORT")]
    pub port: u16,

    /// S3 bucket name holding the uploaded images.
    #[arg(long, env = "PHOTOBIN_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "PHOTOBIN_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "PHOTOBIN_S3_REGION")]
    pub s3_region: String,

    /// Secret key for HMAC-SHA256 signed session cookies.
    ///
    /// The server refuses to start without one.
    #[arg(long, env = "PHOTOBIN_SESSION_SECRET")]
    pub session_secret: Option<String>,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL, env = "PHOTOBIN_SESSION_TTL")]
    pub session_ttl: u64,

    /// API key for the Gemini caption service.
    ///
    /// When absent, caption generation is disabled and `/generate` degrades
    /// to a generic failure message.
    #[arg(long, env = "PHOTOBIN_GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Caption model name passed to the generateContent endpoint.
    #[arg(long, default_value = DEFAULT_CAPTION_MODEL, env = "PHOTOBIN_GEMINI_MODEL")]
    pub gemini_model: String,

    /// Generate and persist a description for every uploaded image.
    #[arg(long, default_value_t = false, env = "PHOTOBIN_CAPTION_ON_UPLOAD")]
    pub caption_on_upload: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_bucket.is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or PHOTOBIN_S3_BUCKET".to_string());
        }

        match &self.session_secret {
            None => {
                return Err(
                    "Session secret is required. Set --session-secret or PHOTOBIN_SESSION_SECRET"
                        .to_string(),
                )
            }
            Some(secret) if secret.len() < 16 => {
                return Err("Session secret must be at least 16 bytes".to_string());
            }
            Some(_) => {}
        }

        if self.session_ttl == 0 {
            return Err("session_ttl must be greater than 0".to_string());
        }

        if self.caption_on_upload && self.gemini_api_key.is_none() {
            return Err(
                "caption-on-upload requires an API key. Set --gemini-api-key or PHOTOBIN_GEMINI_API_KEY"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the session secret, empty if not set (call validate() first).
    pub fn session_secret_or_empty(&self) -> &str {
        self.session_secret.as_deref().unwrap_or("")
    }
}
