use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::api::middleware::AppError;
use crate::models::{QueryResult, Schema};
use crate::services::database::DatabaseConnector;
use crate::services::db_service::DbService;
use crate::services::export::rows_to_csv;
use crate::services::llm_service::TextGenerator;
use crate::services::translator::SqlTranslator;
use crate::validation::SqlValidator;

pub const SAMPLE_TABLE_DDL: &str =
    "CREATE TABLE IF NOT EXISTS USERS (ID INT AUTO_INCREMENT PRIMARY KEY, NAME VARCHAR(100) NOT NULL)";
pub const SAMPLE_USERS: [&str; 3] = ["Vansh", "Anuj", "Arihant"];

/// One user's working context: a connection, a translator and the last result.
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    db: DbService,
    translator: SqlTranslator,
    last_result: Option<QueryResult>,
}

impl Session {
    pub async fn open(
        connector: Arc<dyn DatabaseConnector>,
        generator: Arc<dyn TextGenerator>,
        default_database: Option<&str>,
    ) -> Result<Self, AppError> {
        let db = DbService::connect(connector, default_database).await?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            db,
            translator: SqlTranslator::new(generator),
            last_result: None,
        })
    }

    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> QueryResult {
        let result = self.db.execute_with_params(sql, params).await;

        if !result.is_error() && SqlValidator::is_schema_change(sql) {
            self.refresh_schema().await;
            tracing::info!("Schema updated after table creation");
        }

        self.last_result = Some(result.clone());
        result
    }

    /// SQL for `request`, or an `"Error: ..."` message.
    pub async fn translate(&self, request: &str) -> String {
        self.translator.translate(request).await
    }

    pub async fn generate_sql(&self, request: &str) -> Result<String, AppError> {
        self.translator.generate_sql(request).await
    }

    /// Merge the live database schema into the translator's schema.
    pub async fn refresh_schema(&mut self) -> &Schema {
        let schema = self.db.get_schema().await;
        for table in schema.tables() {
            self.translator.update_schema(table.name.clone(), table.columns.clone());
        }
        self.translator.schema()
    }

    /// Switch databases and replace the translator's schema with the new one.
    ///
    /// The seeded `users` entry is not re-added; an empty database leaves the
    /// translator with no schema until a refresh or table creation.
    pub async fn switch_database(&mut self, name: &str) -> bool {
        if !self.db.switch_database(name).await {
            return false;
        }
        let schema = self.db.get_schema().await;
        if schema.is_empty() {
            tracing::warn!("No tables found in database {}", name);
        }
        self.translator.replace_schema(schema);
        true
    }

    pub async fn list_databases(&mut self) -> Vec<String> {
        self.db.list_databases().await
    }

    pub async fn current_database(&mut self) -> Option<String> {
        self.db.current_database().await
    }

    pub fn schema(&self) -> &Schema {
        self.translator.schema()
    }

    /// Create the sample USERS table if needed, insert the sample rows, and return the table contents.
    pub async fn add_sample_users(&mut self) -> QueryResult {
        let created = self.db.execute(SAMPLE_TABLE_DDL).await;
        if created.is_error() {
            return created;
        }

        for name in SAMPLE_USERS {
            let inserted = self
                .db
                .execute_with_params("INSERT INTO USERS (name) VALUES (?)", &[Value::from(name)])
                .await;
            if inserted.is_error() {
                return inserted;
            }
        }
        tracing::info!("Sample users added");

        self.execute("SELECT ID, NAME FROM USERS", &[]).await
    }

    /// CSV of the most recent row result, if there is one.
    pub fn export_last_result(&self) -> Result<Option<String>, AppError> {
        match self.last_result.as_ref().and_then(QueryResult::rows) {
            Some(rows) => rows_to_csv(rows).map(Some),
            None => Ok(None),
        }
    }

    pub async fn close(&mut self) {
        self.db.close().await;
    }
}

/// Live sessions of the HTTP front-end, keyed by session id.
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
    connector: Arc<dyn DatabaseConnector>,
    generator: Arc<dyn TextGenerator>,
    default_database: Option<String>,
}

impl SessionManager {
    pub fn new(
        connector: Arc<dyn DatabaseConnector>,
        generator: Arc<dyn TextGenerator>,
        default_database: Option<String>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            connector,
            generator,
            default_database,
        }
    }

    /// Open a session and load the current database schema into its translator.
    pub async fn create(&self) -> Result<Arc<Mutex<Session>>, AppError> {
        let mut session = Session::open(
            self.connector.clone(),
            self.generator.clone(),
            self.default_database.as_deref(),
        )
        .await?;
        session.refresh_schema().await;

        let id = session.id.clone();
        let session = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id.clone(), session.clone());
        tracing::info!("Created session {}", id);

        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    /// Close and forget a session.
    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;

        session.lock().await.close().await;
        tracing::info!("Closed session {}", id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every session, used on shutdown.
    pub async fn close_all(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, session) in sessions {
            session.lock().await.close().await;
        }
    }
}
