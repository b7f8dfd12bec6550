use slide_api::GatewayError;

/// Failure to bring an integration up. Nothing is registered when this is returned.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Credentials were rejected; retrying will not help until they are re-entered.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Integration not ready: {0}")]
    NotReady(GatewayError),
}

impl SetupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SetupError::NotReady(_))
    }
}

impl From<GatewayError> for SetupError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::AuthenticationFailed(message) => SetupError::AuthenticationFailed(message),
            e => SetupError::NotReady(e),
        }
    }
}
