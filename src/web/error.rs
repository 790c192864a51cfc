use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

/// Failures a request can end in. Each maps to a status and a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Student not found")]
    StudentNotFound,
    #[error("Chart type not found")]
    UnknownChart(String),
    #[error("chart rendering failed: {0:#}")]
    Render(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::StudentNotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            // `img` stays present so callers that only read it still get "".
            ApiError::UnknownChart(id) => {
                warn!("unknown chart type '{id}'");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "img": "", "error": message })),
                )
                    .into_response()
            }
            ApiError::Render(_) => {
                error!("{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}
