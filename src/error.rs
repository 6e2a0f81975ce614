use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column `{0}` not found in dataset")]
    MissingColumn(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unsupported type {type_name} for column `{column}`")]
    UnsupportedColumnType { column: String, type_name: String },
}

// Handler-facing error; the cause is logged and never sent to the client.
#[derive(Debug)]
pub struct ApiError(pub DatasetError);

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self.0);
        let body = serde_json::json!({ "error": "internal server error" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
