use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::session::AppState;
use crate::api::handlers::{database, query, session};
use crate::services::SessionManager;

/// Create router with application state
pub fn create_router_with_state(sessions: Arc<SessionManager>) -> Router {
    let state = AppState { sessions };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(session::create_session))
        .route("/api/sessions/{id}", axum::routing::delete(session::delete_session))
        .route("/api/sessions/{id}/databases", get(database::list_databases))
        .route("/api/sessions/{id}/database", post(database::switch_database))
        .route("/api/sessions/{id}/schema", get(database::get_schema))
        .route("/api/sessions/{id}/query", post(query::execute_query))
        .route("/api/sessions/{id}/translate", post(query::translate_query))
        .route("/api/sessions/{id}/sample-data", post(query::add_sample_data))
        .route("/api/sessions/{id}/export", get(query::export_results))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::testing::FakeConnector;
    use crate::services::translator::testing::StubGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn shop_connector() -> FakeConnector {
        FakeConnector::with_databases(vec![
            ("shop", vec![("users", vec!["id", "name"])]),
            ("crm", vec![("contacts", vec!["id", "email"])]),
        ])
    }

    fn app(connector: &FakeConnector, reply: &str) -> Router {
        let sessions = SessionManager::new(
            Arc::new(connector.clone()),
            StubGenerator::replying(reply),
            Some("shop".to_string()),
        );
        create_router_with_state(Arc::new(sessions))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        json_body(&body)["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(&shop_connector(), ""), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_create_session_reports_database_and_schema() {
        let app = app(&shop_connector(), "");
        let (status, body) = send(&app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let body = json_body(&body);
        assert_eq!(body["current_database"], "shop");
        assert_eq!(body["schema"], json!({"users": ["id", "name"]}));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app(&shop_connector(), "");
        let (status, body) = send(&app, "GET", "/api/sessions/nope/schema", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_query_returns_tagged_result() {
        let connector = shop_connector();
        connector.server.lock().unwrap().rows.insert(
            "SELECT id, name FROM users".to_string(),
            vec![json!({"id": 1, "name": "Vansh"}).as_object().unwrap().clone()],
        );
        let app = app(&connector, "");
        let id = new_session(&app).await;

        let uri = format!("/api/sessions/{}/query", id);
        let (status, body) = send(&app, "POST", &uri, Some(json!({"query": "SELECT id, name FROM users"}))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["result"]["kind"], "rows");
        assert_eq!(body["result"]["rows"][0]["name"], "Vansh");

        let (status, body) = send(&app, "POST", &uri, Some(json!({"query": "SELEC"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["result"]["kind"], "error");

        let (status, _) = send(&app, "POST", &uri, Some(json!({"query": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_translate_with_execute() {
        let connector = shop_connector();
        let sql = "SELECT id, name FROM users LIMIT 100";
        connector.server.lock().unwrap().rows.insert(sql.to_string(), vec![]);
        let app = app(&connector, sql);
        let id = new_session(&app).await;

        let uri = format!("/api/sessions/{}/translate", id);
        let (status, body) = send(&app, "POST", &uri, Some(json!({"question": "list all users", "execute": true}))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["generated_sql"], sql);
        assert_eq!(body["result"]["kind"], "no_results");
    }

    #[tokio::test]
    async fn test_translate_rejects_unsafe_sql() {
        let app = app(&shop_connector(), "DELETE FROM users");
        let id = new_session(&app).await;

        let uri = format!("/api/sessions/{}/translate", id);
        let (status, body) = send(&app, "POST", &uri, Some(json!({"question": "remove everyone"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(&body)["error"]["code"], "UNSAFE_QUERY");
    }

    #[tokio::test]
    async fn test_switch_database() {
        let app = app(&shop_connector(), "");
        let id = new_session(&app).await;
        let uri = format!("/api/sessions/{}/database", id);

        let (status, body) = send(&app, "POST", &uri, Some(json!({"name": "crm"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["schema"], json!({"contacts": ["id", "email"]}));

        let (status, _) = send(&app, "POST", &uri, Some(json!({"name": "missing"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (_, body) = send(&app, "GET", &format!("/api/sessions/{}/databases", id), None).await;
        let body = json_body(&body);
        assert_eq!(body["databases"], json!(["shop", "crm"]));
        assert_eq!(body["current_database"], "crm");
    }

    #[tokio::test]
    async fn test_export_requires_rows() {
        let connector = shop_connector();
        connector.server.lock().unwrap().rows.insert(
            "SELECT id FROM users".to_string(),
            vec![json!({"id": 1}).as_object().unwrap().clone()],
        );
        let app = app(&connector, "");
        let id = new_session(&app).await;
        let export = format!("/api/sessions/{}/export", id);

        let (status, _) = send(&app, "GET", &export, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(
            &app,
            "POST",
            &format!("/api/sessions/{}/query", id),
            Some(json!({"query": "SELECT id FROM users"})),
        )
        .await;
        let (status, body) = send(&app, "GET", &export, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"id\n1\n");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let connector = shop_connector();
        let app = app(&connector, "");
        let id = new_session(&app).await;

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(connector.server.lock().unwrap().open_connections, 0);

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
