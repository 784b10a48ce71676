use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::api::handlers::session::AppState;
use crate::api::middleware::AppError;
use crate::models::{NaturalLanguageQueryRequest, QueryRequest};
use crate::services::export::export_filename;

/// Execute SQL text as given
pub async fn execute_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Executing SQL query for session: {}", id);

    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("SQL query cannot be empty".to_string()));
    }

    let session = state.sessions.get(&id).await?;
    let result = session.lock().await.execute(query, &payload.params).await;

    Ok(Json(serde_json::json!({
        "result": result,
        "message": result.to_string(),
    })))
}

/// Translate a natural-language request, optionally executing the generated SQL
pub async fn translate_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NaturalLanguageQueryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Translating natural language request for session: {}", id);

    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    let generated_sql = session.generate_sql(question).await?;

    let result = if payload.execute {
        Some(session.execute(&generated_sql, &[]).await)
    } else {
        None
    };

    Ok(Json(serde_json::json!({
        "generated_sql": generated_sql,
        "result": result,
    })))
}

/// Insert the sample users and return the table contents
pub async fn add_sample_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state.sessions.get(&id).await?;
    let result = session.lock().await.add_sample_users().await;

    if let crate::models::QueryResult::Error { message } = &result {
        return Err(AppError::QueryExecution(message.clone()));
    }

    Ok(Json(serde_json::json!({
        "result": result,
    })))
}

/// Download the last row result as CSV
pub async fn export_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(&id).await?;
    let csv = session
        .lock()
        .await
        .export_last_result()?
        .ok_or_else(|| AppError::NotFound("No query results to export".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", export_filename("query_results"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
