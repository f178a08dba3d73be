use crate::error::AppError;
use crate::models::EnqueueRequest;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use matchmaker::events::{QUEUE_CANCELLED, QueueCancelledEvent};
use types::ids::ParticipantId;
use types::now_nanos;
use types::participant::{MatchAttributes, Participant};

pub async fn enqueue(
    State(state): State<AppState>,
    Json(payload): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<Participant>), AppError> {
    let participant_id = ParticipantId::try_new(payload.participant_id)
        .ok_or_else(|| AppError::BadRequest("participantId must not be empty".into()))?;

    state.check_rate_limit(participant_id.as_str(), "enqueue")?;

    let attributes = MatchAttributes::new(payload.category, payload.region);
    let participant = state
        .store
        .enqueue(participant_id, attributes, now_nanos())
        .await?;

    tracing::info!(
        participant_id = %participant.participant_id,
        "Participant joined the queue"
    );
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Participant>, AppError> {
    let participant_id = ParticipantId::try_new(participant_id)
        .ok_or_else(|| AppError::BadRequest("participantId must not be empty".into()))?;

    state.check_rate_limit(participant_id.as_str(), "cancel")?;

    let participant = state.store.mark_cancelled(&participant_id).await?;
    tracing::info!(participant_id = %participant_id, "Participant left the queue");

    let event = QueueCancelledEvent {
        participant_id: participant_id.clone(),
    };
    let payload = serde_json::to_value(&event).map_err(anyhow::Error::from)?;
    if let Err(err) = state
        .notifier
        .deliver(&participant_id, QUEUE_CANCELLED, &payload)
        .await
    {
        tracing::warn!(
            participant_id = %participant_id,
            error = %err,
            "Failed to deliver queue_cancelled"
        );
    }

    Ok(Json(participant))
}
