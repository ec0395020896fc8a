use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource read failed: {0}")]
    ResourceRead(String),

    #[error("Resource write failed: {0}")]
    ResourceWrite(String),

    #[error("Resource changed concurrently: {0}")]
    Conflict(String),

    #[error("Malformed control plane response: {0}")]
    MalformedResponse(String),

    #[error("Publishing bot file failed: {0}")]
    Publish(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn publish<S: Into<String>>(msg: S) -> Self {
        Self::Publish(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::FORBIDDEN,
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::ResourceRead(_) => StatusCode::BAD_GATEWAY,
            Self::ResourceWrite(_) => StatusCode::BAD_GATEWAY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Publish(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}
