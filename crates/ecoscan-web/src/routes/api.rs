//! REST API endpoints.

use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ecoscan_core::table::{decode_text, read_records, TextEncoding};
use ecoscan_core::{EcoScanError, ResultRow};
use ecoscan_engine::{Analysis, Pipeline};
use serde::Serialize;
use tracing::{error, info, warn};

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Successful analysis response.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub results: Vec<ResultRow>,
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// A failed request: status code plus a message safe to show the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Analysis failed due to an internal error.",
        )
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        warn!(%status, error = %err.body_text(), "rejected upload");
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "The uploaded file is too large.")
        } else {
            Self::new(StatusCode::BAD_REQUEST, "The upload could not be read.")
        }
    }
}

impl From<EcoScanError> for ApiError {
    fn from(err: EcoScanError) -> Self {
        error!(error = %err, "analysis failed");
        if !err.is_input_error() {
            return Self::internal();
        }
        let message = match err {
            EcoScanError::Schema(_) => {
                "Every row needs a text value in the 'Sequence' column."
            }
            EcoScanError::EmptyBatch => "The file contains no samples.",
            EcoScanError::DegenerateBatch { .. } => {
                "The sequences are too short or too uniform to analyze."
            }
            _ => "The file is not valid CSV.",
        };
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Liveness message.
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "EcoScan API is running. POST a CSV file to /analyze.".to_string(),
    })
}

/// Service health and version.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Analyze an uploaded CSV batch.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (file_name, bytes) = loop {
        let Some(field) = multipart.next_field().await? else {
            warn!("upload without a '{FILE_FIELD}' field");
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Expected a multipart field named 'file'.",
            ));
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_csv(&file_name) {
            warn!(%file_name, "rejected non-CSV upload");
            return Err(ApiError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Only .csv files are accepted.",
            ));
        }
        break (file_name, field.bytes().await?);
    };

    if bytes.len() > state.max_upload_bytes() {
        warn!(%file_name, size = bytes.len(), "rejected oversized upload");
        return Err(ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "The uploaded file is too large.",
        ));
    }

    let (text, encoding) = decode_text(&bytes);
    if encoding == TextEncoding::Latin1 {
        warn!(%file_name, "upload is not UTF-8, decoded as Latin-1");
    }

    let config = state.pipeline_config().clone();
    let analysis: Analysis = tokio::task::spawn_blocking(move || {
        let records = read_records(&text)?;
        Pipeline::new(config)?.run_with_summary(&records)
    })
    .await
    .map_err(|err| {
        error!(error = %err, "analysis task failed");
        ApiError::internal()
    })??;

    info!(
        %file_name,
        samples = analysis.summary.samples,
        flagged = analysis.summary.flagged,
        "analyzed upload"
    );
    Ok(Json(AnalyzeResponse {
        status: "success",
        results: analysis.rows,
    }))
}

fn is_csv(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
