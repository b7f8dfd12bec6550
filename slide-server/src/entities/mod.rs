//! Entities exposed to the host for every slide of an account.

mod cover;
mod switch;

pub use cover::SlideCover;
pub use switch::TouchAndGoSwitch;

use async_trait::async_trait;
use slide_api::GatewayError;

use crate::models::{CoverView, SnapshotCollection, SwitchView};

/// A controllable window covering.
#[async_trait]
pub trait Cover: Send + Sync {
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    async fn view(&self) -> CoverView;

    async fn open_cover(&self) -> Result<(), GatewayError>;

    async fn close_cover(&self) -> Result<(), GatewayError>;

    async fn stop_cover(&self) -> Result<(), GatewayError>;

    /// Move to `position` on a 0-100 scale, 100 fully closed.
    async fn set_cover_position(&self, position: u8) -> Result<(), GatewayError>;

    /// Query the slide directly instead of waiting for the next poll.
    async fn update(&self) -> Result<(), GatewayError>;

    async fn handle_coordinator_update(&self, data: &SnapshotCollection);
}

/// A configuration switch attached to a cover.
#[async_trait]
pub trait ConfigSwitch: Send + Sync {
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    async fn view(&self) -> SwitchView;

    async fn is_on(&self) -> bool;

    async fn is_off(&self) -> bool;

    async fn turn_on(&self) -> Result<(), GatewayError>;

    async fn turn_off(&self) -> Result<(), GatewayError>;

    async fn handle_coordinator_update(&self, data: &SnapshotCollection);
}
