pub mod protocol;
pub mod rest;
pub mod session_task;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use rest::{
    apply_action_handler, create_session_handler, delete_session_handler, get_session_handler,
};
use state::AppState;

/// Builds the session routes. CORS and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{session_id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/sessions/{session_id}/actions", post(apply_action_handler))
        .with_state(app_state)
}

/// Periodically forgets sessions whose task has stopped after going idle.
pub async fn sweep_expired_sessions(app_state: Arc<AppState>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let removed = app_state.sessions.prune_closed().await;
        if removed > 0 {
            debug!("Swept {} expired sessions.", removed);
        }
    }
}
