use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::IntegrationState;
use crate::errors::{ApiError, EntityError};
use crate::models::{CommandAccepted, CoverCommand, CoverView};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPositionRequest {
    /// 0 fully open, 100 fully closed
    pub position: i64,
}

pub async fn get_covers(
    State(state): State<IntegrationState>,
) -> Result<Json<Vec<CoverView>>, ApiError> {
    let mut views = Vec::new();
    for cover in state.context.covers() {
        views.push(cover.view().await);
    }

    Ok(Json(views))
}

pub async fn get_cover(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<Json<CoverView>, ApiError> {
    let cover = state
        .context
        .cover(&unique_id)
        .ok_or(EntityError::CoverNotFound)?;

    Ok(Json(cover.view().await))
}

pub async fn open_cover(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<(StatusCode, Json<CommandAccepted>), ApiError> {
    accept(&state, &unique_id, CoverCommand::Open).await
}

pub async fn close_cover(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<(StatusCode, Json<CommandAccepted>), ApiError> {
    accept(&state, &unique_id, CoverCommand::Close).await
}

pub async fn stop_cover(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<(StatusCode, Json<CommandAccepted>), ApiError> {
    accept(&state, &unique_id, CoverCommand::Stop).await
}

pub async fn set_cover_position(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
    Json(body): Json<SetPositionRequest>,
) -> Result<(StatusCode, Json<CommandAccepted>), ApiError> {
    let position = u8::try_from(body.position)
        .ok()
        .filter(|position| *position <= 100)
        .ok_or(EntityError::InvalidPosition(body.position))?;

    accept(&state, &unique_id, CoverCommand::SetPosition { position }).await
}

/// Query the slide directly and return the refreshed view.
pub async fn update_cover(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<Json<CoverView>, ApiError> {
    let cover = state
        .context
        .cover(&unique_id)
        .ok_or(EntityError::CoverNotFound)?;

    cover.update().await?;

    Ok(Json(cover.view().await))
}

async fn accept(
    state: &IntegrationState,
    unique_id: &str,
    command: CoverCommand,
) -> Result<(StatusCode, Json<CommandAccepted>), ApiError> {
    let accepted = state.context.run_command(unique_id, command).await?;

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
