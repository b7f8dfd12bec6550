use slide_api::GatewayError;

use super::EntityError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Entity error: {0}")]
    EntityError(#[from] EntityError),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
}
