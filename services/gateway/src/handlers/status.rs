use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use types::ids::{MatchId, ParticipantId};
use types::match_record::{Match, MatchStatus};
use types::participant::Participant;
use uuid::Uuid;

fn parse_match_id(raw: &str) -> Result<MatchId, AppError> {
    Uuid::parse_str(raw)
        .map(MatchId::from_uuid)
        .map_err(|_| AppError::BadRequest(format!("Invalid match id: {}", raw)))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Participant>, AppError> {
    let participant = state
        .store
        .participant(&ParticipantId::new(participant_id))
        .await?;
    Ok(Json(participant))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Match>, AppError> {
    let match_id = parse_match_id(&match_id)?;
    Ok(Json(state.store.get_match(&match_id).await?))
}

pub async fn confirm_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Match>, AppError> {
    let match_id = parse_match_id(&match_id)?;
    let record = state
        .store
        .set_match_status(&match_id, MatchStatus::Confirmed)
        .await?;
    tracing::info!(match_id = %match_id, "Match confirmed");
    Ok(Json(record))
}

/// Ends a match so its members may queue again
pub async fn expire_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Match>, AppError> {
    let match_id = parse_match_id(&match_id)?;
    let record = state
        .store
        .set_match_status(&match_id, MatchStatus::Expired)
        .await?;
    tracing::info!(match_id = %match_id, "Match expired");
    Ok(Json(record))
}
