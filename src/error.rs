use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ReplaceResponse;

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Backend response status={status}")]
    BackendStatus { status: String, url: String, body: String },

    #[error("No data: {0}")]
    NoData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ComparisonError {
    /// Short label used for the failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            ComparisonError::Transport(_) => "transport",
            ComparisonError::HttpStatus { .. } => "http_status",
            ComparisonError::Decode(_) => "decode",
            ComparisonError::BackendStatus { .. } => "backend_status",
            ComparisonError::NoData(_) => "no_data",
            ComparisonError::Config(_) => "config",
            ComparisonError::Persistence(_) => "persistence",
            ComparisonError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for ComparisonError {
    fn from(err: reqwest::Error) -> Self {
        ComparisonError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ComparisonError {
    fn from(err: serde_json::Error) -> Self {
        ComparisonError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ComparisonError {
    fn from(err: std::io::Error) -> Self {
        ComparisonError::Persistence(err.to_string())
    }
}

// The configuration endpoint reports failures in the body, never in the status line.
impl IntoResponse for ComparisonError {
    fn into_response(self) -> Response {
        let body = Json(ReplaceResponse::error(self.to_string()));
        (StatusCode::OK, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ComparisonError>;
