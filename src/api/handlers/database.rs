use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::handlers::session::AppState;
use crate::api::middleware::AppError;
use crate::models::SwitchDatabaseRequest;

/// List user databases and the one currently selected
pub async fn list_databases(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    let databases = session.list_databases().await;
    let current_database = session.current_database().await;

    Ok(Json(serde_json::json!({
        "databases": databases,
        "current_database": current_database,
    })))
}

/// Switch the session to another database and reload its schema
pub async fn switch_database(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SwitchDatabaseRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Database name cannot be empty".to_string()));
    }

    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    if !session.switch_database(name).await {
        return Err(AppError::Connection(format!(
            "Failed to switch to database {}. Check that it exists and you have access to it.",
            name
        )));
    }

    Ok(Json(serde_json::json!({
        "current_database": name,
        "schema": session.schema(),
    })))
}

/// Refresh the schema from the database and return it
pub async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    let schema = session.refresh_schema().await;
    tracing::info!("Schema refreshed for session {} ({} tables)", id, schema.len());

    Ok(Json(serde_json::json!({
        "schema": schema,
    })))
}
