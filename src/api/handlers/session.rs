use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::services::SessionManager;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

/// Open a new session with its own database connection
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let session = state.sessions.create().await?;
    let mut session = session.lock().await;
    let current_database = session.current_database().await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.id,
            "created_at": session.created_at,
            "current_database": current_database,
            "schema": session.schema(),
        })),
    ))
}

/// Close a session and its connection
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    tracing::info!("Deleting session: {}", id);
    state.sessions.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
