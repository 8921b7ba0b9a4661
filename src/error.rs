use crate::server::types::ConvertResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the external document-to-Markdown capability.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to launch converter `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),

    #[error("converter produced non-UTF-8 output for '{}'", path.display())]
    Encoding { path: PathBuf },

    #[error("image captioning failed: {0}")]
    Captioning(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("'{url}' is larger than the {limit} byte download limit")]
    TooLarge { url: String, limit: usize },

    #[error("failed to stage downloaded content: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    Closed,

    #[error("conversion worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Every failure the conversion endpoint can report, mapped to a status code at
/// the handler boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file or URL provided")]
    NoInput,

    #[error("No file provided")]
    NoFile,

    #[error("Failed to download file")]
    Download(#[source] DownloadError),

    #[error("File size exceeds the limit ({limit_mb}MB)")]
    PayloadTooLarge { limit_mb: usize },

    #[error("{0}")]
    Multipart(String),

    #[error("{0}")]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Staging(#[from] std::io::Error),

    #[error("{0}")]
    Worker(#[from] PoolError),
}

impl ApiError {
    /// A request that was read and staged but failed to convert is still answered
    /// with 200; the body carries `success: false`.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conversion(_) | ApiError::Worker(_) => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Download(cause) => {
                tracing::warn!(error = %cause, "remote download failed");
            }
            ApiError::Conversion(cause) => {
                tracing::warn!(error = %cause, "conversion failed");
            }
            ApiError::Staging(cause) => {
                tracing::error!(error = %cause, "failed to stage upload");
            }
            ApiError::Worker(cause) => {
                tracing::error!(error = %cause, "conversion worker failed");
            }
            _ => {}
        }
        (self.status(), Json(ConvertResponse::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use super::{ApiError, ConversionError, DownloadError, PoolError};
    use axum::http::StatusCode;

    #[test]
    fn test_static_messages() {
        assert_eq!(ApiError::NoInput.to_string(), "No file or URL provided");
        assert_eq!(ApiError::NoFile.to_string(), "No file provided");
        assert_eq!(
            ApiError::PayloadTooLarge { limit_mb: 16 }.to_string(),
            "File size exceeds the limit (16MB)"
        );
    }

    #[test]
    fn test_download_cause_is_not_exposed() {
        let err = ApiError::Download(DownloadError::Status {
            url: "https://example.com/x".to_string(),
            status: 404,
        });
        assert_eq!(err.to_string(), "Failed to download file");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_oversized_download_is_a_download_failure() {
        let err = ApiError::Download(DownloadError::TooLarge {
            url: "https://example.com/big.pdf".to_string(),
            limit: 1024,
        });
        assert_eq!(err.to_string(), "Failed to download file");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conversion_error_carries_raw_message() {
        let err = ApiError::from(ConversionError::Failed("unsupported format".to_string()));
        assert_eq!(err.to_string(), "unsupported format");
        assert_eq!(err.status(), StatusCode::OK);
        assert_eq!(ApiError::from(PoolError::Closed).status(), StatusCode::OK);
        assert_eq!(
            ApiError::Staging(std::io::Error::other("disk full")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { limit_mb: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
