//! Photobin - a web gallery for JPEG images stored in S3.
//!
//! This binary parses configuration, probes the blob store, and starts the
//! HTTP server.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photobin::{
    create_router, create_s3_client, AppState, BlobStore, Config, GeminiCaptioner,
    MemoryUserStore, S3BlobStore, SessionAuth, JPEG_SUFFIXES,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);

    if config.gemini_api_key.is_some() {
        info!("  Captioning: enabled ({})", config.gemini_model);
        info!("  Caption on upload: {}", config.caption_on_upload);
    } else {
        warn!("  Captioning: DISABLED - /generate will return a failure message");
        warn!("              Enable with --gemini-api-key=<key>");
    }

    // Create the S3 client and test connectivity
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let store = S3BlobStore::new(s3_client, config.s3_bucket.clone());

    info!("");
    info!("Connecting to S3...");
    match store.list_suffix(JPEG_SUFFIXES).await {
        Ok(keys) => {
            info!("  Connected successfully");
            info!("  Found {} image(s) in bucket", keys.len());
        }
        Err(e) => {
            error!("  Failed to connect to S3: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - Your AWS credentials are configured correctly");
            error!(
                "    - The bucket '{}' exists and is accessible",
                config.s3_bucket
            );
            error!("    - The S3 endpoint is correct (if using MinIO/custom S3)");
            return ExitCode::FAILURE;
        }
    }

    // Assemble application state. Accounts live in process memory and are
    // lost on restart.
    let users = Arc::new(MemoryUserStore::default());
    let sessions = SessionAuth::new(
        config.session_secret_or_empty(),
        Duration::from_secs(config.session_ttl),
    );

    let mut state: AppState<S3BlobStore, GeminiCaptioner> =
        AppState::new(store, users, sessions).with_caption_on_upload(config.caption_on_upload);

    if let Some(ref api_key) = config.gemini_api_key {
        state = state.with_oracle(GeminiCaptioner::new(
            api_key.clone(),
            config.gemini_model.clone(),
        ));
    }

    let router = create_router(state, !config.no_tracing);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("Server listening on http://{}", addr);
    info!("Sign up in a browser at http://{}/signup", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Could not bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    match axum::serve(listener, router).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photobin=debug,tower_http=debug"
    } else {
        "photobin=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
