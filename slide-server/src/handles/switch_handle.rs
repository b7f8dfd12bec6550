use axum::Json;
use axum::extract::{Path, State};

use super::IntegrationState;
use crate::errors::{ApiError, EntityError};
use crate::models::SwitchView;

pub async fn get_switches(
    State(state): State<IntegrationState>,
) -> Result<Json<Vec<SwitchView>>, ApiError> {
    let mut views = Vec::new();
    for switch in state.context.switches() {
        views.push(switch.view().await);
    }

    Ok(Json(views))
}

pub async fn get_switch(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<Json<SwitchView>, ApiError> {
    let switch = state
        .context
        .switch(&unique_id)
        .ok_or(EntityError::SwitchNotFound)?;

    Ok(Json(switch.view().await))
}

pub async fn turn_on_switch(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<Json<SwitchView>, ApiError> {
    let switch = state
        .context
        .switch(&unique_id)
        .ok_or(EntityError::SwitchNotFound)?;

    switch.turn_on().await?;

    Ok(Json(switch.view().await))
}

pub async fn turn_off_switch(
    State(state): State<IntegrationState>,
    Path(unique_id): Path<String>,
) -> Result<Json<SwitchView>, ApiError> {
    let switch = state
        .context
        .switch(&unique_id)
        .ok_or(EntityError::SwitchNotFound)?;

    switch.turn_off().await?;

    Ok(Json(switch.view().await))
}
