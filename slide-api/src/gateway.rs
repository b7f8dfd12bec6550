use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{SlideId, SlideInfo, SlideRecord};

/// Remote service controlling the slides of one account.
#[async_trait]
pub trait SlideGateway: Send + Sync {
    /// Validate the credentials and establish a session.
    async fn login(&self) -> Result<(), GatewayError>;

    /// List every slide of the account with its last reported telemetry.
    async fn slides_overview(&self) -> Result<Vec<SlideRecord>, GatewayError>;

    /// Query the live telemetry of a single slide.
    async fn slide_info(&self, id: SlideId) -> Result<SlideInfo, GatewayError>;

    async fn slide_get_position(&self, id: SlideId) -> Result<f64, GatewayError> {
        self.slide_info(id).await?.pos.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("Slide {id} reported no position"))
        })
    }

    /// Move to an absolute position, 0.0 fully open and 1.0 fully closed.
    async fn slide_set_position(&self, id: SlideId, position: f64) -> Result<(), GatewayError>;

    async fn slide_stop(&self, id: SlideId) -> Result<(), GatewayError>;
}
