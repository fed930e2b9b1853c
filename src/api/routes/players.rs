use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{path_tag, ApiError};
use crate::dashboard::{BattleReport, PlayerPanel};

#[derive(Debug, Default, Deserialize)]
pub struct PlayerParams {
    /// Bypass the response cache.
    #[serde(default)]
    pub refresh: bool,
}

pub async fn player(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(params): Query<PlayerParams>,
) -> Result<Json<PlayerPanel>, ApiError> {
    let tag = path_tag(&tag);
    let panel = if params.refresh {
        info!("Refreshing player {}", tag);
        state.dashboard.refresh_player(&tag).await?
    } else {
        state.dashboard.player(&tag).await?
    };
    Ok(Json(panel))
}

pub async fn battle_log(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<BattleReport>, ApiError> {
    let report = state.dashboard.battle_report(&path_tag(&tag)).await?;
    Ok(Json(report))
}
