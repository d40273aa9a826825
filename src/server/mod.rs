//! HTTP service.
//!
//! ```text
//! POST /upload-pdf/   multipart `file`  → {"text": [...], "tables": [...], "images": [...]}
//! POST /upload-pdf    same handler
//! GET  /health        → {"status": "healthy", "version": ..., "engine": ...}
//! ```
//!
//! Startup runs one warm-up conversion before the listener opens so that
//! model loading does not land on the first request.

pub mod error;
pub mod handlers;
pub mod state;

pub use self::error::{ApiError, ErrorResponse};
pub use self::handlers::HealthResponse;
pub use self::state::AppState;

use crate::config::{ServerConfig, WarmupPolicy};
use crate::error::ExtractError;
use crate::extract::Extractor;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the application router.
///
/// Fails only when a configured CORS origin is not a valid header value.
pub fn create_router(state: AppState, config: &ServerConfig) -> Result<Router, ExtractError> {
    let mut router = Router::new()
        .route("/upload-pdf/", post(handlers::upload_pdf))
        .route("/upload-pdf", post(handlers::upload_pdf))
        .route("/health", get(handlers::health))
        .with_state(state);

    router = match config.max_upload_bytes {
        Some(limit) => router
            .layer(DefaultBodyLimit::max(limit))
            .layer(RequestBodyLimitLayer::new(limit)),
        None => router.layer(DefaultBodyLimit::disable()),
    };

    Ok(router
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ExtractError> {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let values = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| ExtractError::InvalidConfig(format!("Invalid CORS origin '{}': {}", o, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!("CORS restricted to {} origin(s)", values.len());
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// The extraction service: configuration plus a shared [`Extractor`].
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
    extractor: Extractor,
}

impl Server {
    pub fn new(config: ServerConfig, extractor: Extractor) -> Self {
        Self { config, extractor }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn router(&self) -> Result<Router, ExtractError> {
        create_router(
            AppState::new(self.extractor.clone(), &self.config),
            &self.config,
        )
    }

    /// Convert the configured sample document once.
    ///
    /// Under [`WarmupPolicy::Warn`] a failure is logged and swallowed; under
    /// [`WarmupPolicy::FailFast`] it is returned.
    pub async fn warm_up(&self) -> Result<(), ExtractError> {
        match self.extractor.warm_up(&self.config.warmup_pdf).await {
            Ok(timings) => {
                info!(
                    "Warm-up complete in {:.2}s",
                    timings.pipeline_total.as_secs_f64()
                );
                Ok(())
            }
            Err(e) => match self.config.warmup_policy {
                WarmupPolicy::Warn => {
                    warn!("Warm-up failed, serving anyway: {}", e);
                    Ok(())
                }
                WarmupPolicy::FailFast => {
                    error!("Warm-up failed: {}", e);
                    Err(e)
                }
            },
        }
    }

    /// Bind and serve until Ctrl-C.
    pub async fn start(&self) -> Result<(), ExtractError> {
        let addr = self.config.socket_addr()?;
        let app = self.router()?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "Listening on http://{} (engine: {})",
            listener.local_addr()?,
            self.extractor.engine_name()
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }

    /// Warm up, then serve.
    pub async fn run(&self) -> Result<(), ExtractError> {
        self.warm_up().await?;
        self.start().await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_empty_origins_allow_any() {
        assert!(cors_layer(&[]).is_ok());
        assert!(cors_layer(&["*".to_string()]).is_ok());
    }

    #[test]
    fn listed_origins_are_validated() {
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());
        let err = cors_layer(&["bad\norigin".to_string()]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }
}
