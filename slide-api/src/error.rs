use std::time::Duration;

/// Failure reported by a slide gateway.
///
/// Authentication failures are kept apart from the transient variants so the
/// setup routine can ask for new credentials instead of retrying.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Gateway request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, GatewayError::AuthenticationFailed(_))
    }

    /// Whether the next poll interval may succeed without user action.
    pub fn is_transient(&self) -> bool {
        !self.is_authentication()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::InvalidResponse(err.to_string())
    }
}
