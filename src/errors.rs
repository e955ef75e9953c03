use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Generic notice returned for any upload failure that is not the caller's fault.
pub const UPLOAD_FAILED_NOTICE: &str = "Failed to create meme. Please try again.";

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error),

    #[error("Stored meme data is corrupt: {0}")]
    DataCorruption(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    #[error("Image host is not configured: {0}")]
    MissingCredentials(&'static str),

    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

/// Failures talking to third-party HTTP APIs (Imgflip, ImgBB).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} reported failure: {message}")]
    Unsuccessful {
        service: &'static str,
        message: String,
    },

    #[error("{0} credentials are missing")]
    MissingCredentials(&'static str),
}

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("Local store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Local store connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Local store value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Error processing multipart form data: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Sign in required")]
    SignInRequired,

    #[error("Meme not found with ID: {0}")]
    MemeNotFound(String),
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    // Collaborator errors
    #[error("Upstream API error")]
    Upstream(#[source] ApiError),
    #[error("Could not access meme data")]
    RepositoryError(#[source] RepoError),
    #[error("Could not perform image storage operation")]
    StorageError(#[source] StorageError),
    #[error("Could not access local store")]
    LocalStore(#[source] LocalStoreError),
    #[error("{}", UPLOAD_FAILED_NOTICE)]
    UploadFailed,

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// Errors caused by the request itself rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::MultipartError(_)
                | AppError::Validation(_)
                | AppError::SignInRequired
                | AppError::MemeNotFound(_)
                | AppError::RouteNotFound(_)
        )
    }
}

// --- Conversions from Domain Errors to AppError ---

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        AppError::RepositoryError(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::StorageError(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<LocalStoreError> for AppError {
    fn from(err: LocalStoreError) -> Self {
        AppError::LocalStore(err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for AppError {
    fn from(err: aws_smithy_types::error::operation::BuildError) -> Self {
        AppError::InitError(format!("Failed to build AWS request: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(format!("IO error: {}", err))
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MultipartError(e) => (StatusCode::BAD_REQUEST, format!("Invalid multipart form data: {}", e)),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SignInRequired => (StatusCode::UNAUTHORIZED, "Please log in to continue".to_string()),
            AppError::MemeNotFound(_) => (StatusCode::NOT_FOUND, "Meme not found".to_string()),
            AppError::RouteNotFound(path) => (StatusCode::NOT_FOUND, format!("No page at {}", path)),

            // 5xx Server Errors
            AppError::Upstream(e) => {
                tracing::error!(error.source = ?e, "Upstream API error occurred");
                (StatusCode::BAD_GATEWAY, "Failed to load memes".to_string())
            }
            AppError::RepositoryError(e) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed".to_string())
            }
            AppError::StorageError(e) => {
                tracing::error!(error.source = ?e, "Storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Image storage operation failed".to_string())
            }
            AppError::LocalStore(e) => {
                tracing::error!(error.source = ?e, "Local store error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Local storage operation failed".to_string())
            }
            AppError::UploadFailed => (StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED_NOTICE.to_string()),
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error".to_string())
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server initialization error".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error.message = %error_message, error.detail = %self, "Responding with error");
        } else {
            tracing::debug!(error.message = %error_message, error.status = %status, "Responding with client error");
        }

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}
