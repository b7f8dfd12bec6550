mod cover_handle;
mod refresh_handle;
mod sse_handle;
mod switch_handle;

pub use cover_handle::*;
pub use refresh_handle::*;
pub use sse_handle::*;
pub use switch_handle::*;

use std::sync::Arc;

use crate::context::IntegrationContext;

#[derive(Clone)]
pub struct IntegrationState {
    pub context: Arc<IntegrationContext>,
}
