pub mod cloud;
pub mod error;
pub mod gateway;
pub mod models;

pub use cloud::{CloudConfig, GoSlideCloud, DEFAULT_CLOUD_HOST};
pub use error::GatewayError;
pub use gateway::SlideGateway;
pub use models::*;
