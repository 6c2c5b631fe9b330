//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{
        AnalysisDto, CategoryDto, ChatMessageDto, ClientAction, CountryDto, DraftDto,
        OnboardingDto, ProfileDto, QuickPromptDto, SessionSnapshot, TaskDto, TaskStatusDto,
        TestScoreDto, UniversityCardDto, UniversityDetailsDto, ViewDto,
    },
    session_task::spawn_session,
    state::{AppState, SessionClosed, SessionHandle},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        get_session_handler,
        apply_action_handler,
        delete_session_handler,
    ),
    components(
        schemas(
            ClientAction, QuickPromptDto, TaskStatusDto, SessionSnapshot, ViewDto, ProfileDto,
            TestScoreDto, OnboardingDto, AnalysisDto, CountryDto, UniversityCardDto, CategoryDto,
            UniversityDetailsDto, TaskDto, ChatMessageDto, DraftDto
        )
    ),
    tags(
        (name = "Dream University API", description = "Session endpoints for the study-abroad funnel.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

type HandlerError = (StatusCode, String);

fn not_found(session_id: Uuid) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Session {} not found", session_id))
}

async fn find_session(app_state: &AppState, session_id: Uuid) -> Result<SessionHandle, HandlerError> {
    app_state.sessions.get(session_id).await.ok_or_else(|| not_found(session_id))
}

/// A session whose task has stopped is forgotten and reported as gone.
async fn session_gone(app_state: &AppState, closed: SessionClosed) -> HandlerError {
    warn!("{}", closed);
    app_state.sessions.remove(closed.0).await;
    (StatusCode::GONE, closed.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new session, starting on the landing view.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created successfully", body = SessionSnapshot),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let handle = spawn_session(&app_state);
    app_state.sessions.insert(handle.clone()).await;
    info!("Created session {}.", handle.session_id);

    let snapshot = handle.snapshot().await.map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to start session: {}", e))
    })?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Fetch the current state of a session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session to read.")),
    responses(
        (status = 200, description = "Current session state", body = SessionSnapshot),
        (status = 404, description = "Unknown session"),
        (status = 410, description = "Session expired or closed")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let handle = find_session(&app_state, session_id).await?;
    match handle.snapshot().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(closed) => Err(session_gone(&app_state, closed).await),
    }
}

/// Apply one user action to a session.
///
/// Actions that are not allowed in the current state are ignored; the
/// returned snapshot shows the session unchanged.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/actions",
    params(("session_id" = Uuid, Path, description = "The session to act on.")),
    request_body = ClientAction,
    responses(
        (status = 200, description = "Session state after the action", body = SessionSnapshot),
        (status = 404, description = "Unknown session"),
        (status = 410, description = "Session expired or closed"),
        (status = 422, description = "Malformed action")
    )
)]
pub async fn apply_action_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(action): Json<ClientAction>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let handle = find_session(&app_state, session_id).await?;
    match handle.apply(action).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(closed) => Err(session_gone(&app_state, closed).await),
    }
}

/// End a session and cancel any work it still has in flight.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session to end.")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    let handle = app_state
        .sessions
        .remove(session_id)
        .await
        .ok_or_else(|| not_found(session_id))?;
    handle.close();
    info!("Deleted session {} after {} s.", session_id, handle.age().num_seconds());
    Ok(StatusCode::NO_CONTENT)
}
