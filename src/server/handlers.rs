//! Request handlers.

use super::error::ApiError;
use super::state::AppState;
use crate::error::ExtractError;
use crate::output::ExtractionOutput;
use crate::upload::UploadedDocument;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// `POST /upload-pdf/`
///
/// Reads the multipart part named `file`, writes it to a temporary `.pdf`
/// file, runs the extraction and returns the combined output. The temporary
/// file is removed on every path out of this handler.
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionOutput>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        if upload.is_some() {
            warn!("Ignoring extra 'file' part");
            continue;
        }
        let file_name = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await.map_err(ApiError::multipart)?;
        upload = Some((data, file_name));
    }

    let Some((data, file_name)) = upload else {
        return Err(ApiError::missing_file());
    };
    info!(
        "Received upload '{}' ({} bytes)",
        file_name.as_deref().unwrap_or("unnamed"),
        data.len()
    );

    let policy = state.error_policy();
    let temp_dir = state.temp_dir().map(|d| d.to_path_buf());
    let document = tokio::task::spawn_blocking(move || {
        UploadedDocument::persist(&data, file_name, temp_dir.as_deref())
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Upload task panicked: {}", e)))
    .and_then(|r| r)
    .map_err(|e| {
        error!("Could not store upload: {}", e);
        ApiError::from_extraction(&e, policy)
    })?;

    let result = state.extractor().extract(document.path()).await;
    drop(document);

    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            error!("Extraction failed: {}", e);
            Err(ApiError::from_extraction(&e, policy))
        }
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.extractor().engine_name().to_string(),
    })
}
