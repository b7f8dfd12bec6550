use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::IntegrationState;
use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub devices: usize,
    pub online: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

pub async fn refresh(
    State(state): State<IntegrationState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let data = state.context.refresh().await?;

    Ok(Json(RefreshResponse {
        devices: data.len(),
        online: data.online_count(),
        fetched_at: data.fetched_at(),
    }))
}
