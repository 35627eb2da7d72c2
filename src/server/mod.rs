mod error;
mod files;
mod passthrough;
mod routes;
#[cfg(test)]
mod testing;

use error::{ApiError, ApiResult};
use crate::config::{Config, PassthroughConfig};
use crate::media::{Extractor, ScratchDir, Transcoder};
use anyhow::{Context, Result};
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Everything a handler needs. Cheap to clone; tools are injected at startup.
#[derive(Clone)]
pub struct AppState {
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn Transcoder>,
    scratch: ScratchDir,
    jobs: Arc<Semaphore>,
    http: reqwest::Client,
    passthrough: Arc<PassthroughConfig>,
    default_audio_format_id: Arc<str>,
}

impl AppState {
    pub fn new(
        config: &Config,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self> {
        let scratch = ScratchDir::new(&config.downloads.scratch_dir)?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(
                config.passthrough.connect_timeout_secs,
            ))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            extractor,
            transcoder,
            scratch,
            jobs: Arc::new(Semaphore::new(config.downloads.max_concurrent_jobs)),
            http,
            passthrough: Arc::new(config.passthrough.clone()),
            default_audio_format_id: config.downloads.default_audio_format_id.as_str().into(),
        })
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Waits for a free slot before any extractor or transcoder work starts.
    async fn acquire_job(&self) -> ApiResult<OwnedSemaphorePermit> {
        if self.jobs.available_permits() == 0 {
            info!("All job slots busy, waiting");
        }
        self.jobs
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ApiError::internal("Server is shutting down"))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/download", post(routes::fetch_info))
        .route("/api/download-video", post(routes::download_video))
        .route(
            "/api/download-thumbnail-file",
            post(routes::download_thumbnail),
        )
        .route("/api/stream", get(routes::stream))
        .route("/api/download-audio", post(routes::download_audio))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: &Config, state: AppState) -> Result<()> {
    let stale_after = Duration::from_secs(config.downloads.stale_after_secs);
    if let Err(e) = state.scratch().sweep(stale_after) {
        warn!("Failed to sweep scratch directory: {:#}", e);
    }
    info!("Scratch directory: {}", state.scratch().root().display());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("✅ Server running at http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
}
