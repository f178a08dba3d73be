use crate::handlers::{queue, status, ws};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

async fn root() -> &'static str {
    "Matchmaking API is running"
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/queue", post(queue::enqueue))
        .route("/queue/{participant_id}", delete(queue::cancel))
        .route("/participants/{participant_id}", get(status::get_participant))
        .route("/matches/{match_id}", get(status::get_match))
        .route("/matches/{match_id}/confirm", post(status::confirm_match))
        .route("/matches/{match_id}/expire", post(status::expire_match))
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .route("/", get(root))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
