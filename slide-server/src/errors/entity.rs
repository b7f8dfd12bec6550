use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("Cover not found")]
    CoverNotFound,

    #[error("Switch not found")]
    SwitchNotFound,

    #[error("Position must be between 0 and 100, got {0}")]
    InvalidPosition(i64),

    #[error("Integration is shutting down")]
    Unloaded,
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::CoverNotFound => StatusCode::NOT_FOUND,
            EntityError::SwitchNotFound => StatusCode::NOT_FOUND,
            EntityError::InvalidPosition(_) => StatusCode::BAD_REQUEST,
            EntityError::Unloaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
