use crate::api::middleware::AppError;
use crate::models::{QueryResult, Schema};
use crate::services::database::{is_system_database, DatabaseConnection, DatabaseConnector};
use crate::validation::SqlValidator;
use serde_json::Value;
use std::sync::Arc;

/// Query executor: owns at most one live connection and runs SQL against it.
///
/// Public operations never return driver errors to the caller. Failures are
/// logged and folded into the return value (`false`, an empty list, `None`,
/// or `QueryResult::Error`).
pub struct DbService {
    connector: Arc<dyn DatabaseConnector>,
    connection: Option<Box<dyn DatabaseConnection>>,
}

impl DbService {
    /// Connect without selecting a database, then switch to `default_database` if given.
    pub async fn connect(
        connector: Arc<dyn DatabaseConnector>,
        default_database: Option<&str>,
    ) -> Result<Self, AppError> {
        let connection = connector.connect(None).await?;
        tracing::info!("Database connection successful");

        let mut service = Self {
            connector,
            connection: Some(connection),
        };

        if let Some(name) = default_database {
            if !service.switch_database(name).await {
                tracing::warn!("Default database {} could not be selected", name);
            }
        }

        Ok(service)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// User databases, system schemas excluded. Empty on any failure.
    pub async fn list_databases(&mut self) -> Vec<String> {
        match self.all_databases().await {
            Ok(databases) => databases
                .into_iter()
                .filter(|db| !is_system_database(db))
                .collect(),
            Err(e) => {
                tracing::error!("Error listing databases: {}", e);
                Vec::new()
            }
        }
    }

    /// Reconnect scoped to `name`. Unknown names are rejected before the
    /// current connection is touched.
    ///
    /// If the new connection fails after the old one was closed the service
    /// stays disconnected until a later switch succeeds.
    pub async fn switch_database(&mut self, name: &str) -> bool {
        let databases = match self.all_databases().await {
            Ok(databases) => databases,
            Err(e) => {
                tracing::error!("Error switching to database {}: {}", name, e);
                return false;
            }
        };

        if !databases.iter().any(|db| db == name) {
            tracing::warn!("Database {} does not exist", name);
            return false;
        }

        self.close().await;

        match self.connector.connect(Some(name)).await {
            Ok(mut connection) => {
                if let Err(e) = connection.ping().await {
                    tracing::error!("Failed to establish connection to the database {}: {}", name, e);
                    if let Err(e) = connection.close().await {
                        tracing::warn!("{}", e);
                    }
                    return false;
                }
                self.connection = Some(connection);
                tracing::info!("Switched to database: {}", name);
                true
            }
            Err(e) => {
                tracing::error!("Error switching to database {}: {}", name, e);
                false
            }
        }
    }

    /// The selected database, or None when nothing is selected or the connection is gone.
    pub async fn current_database(&mut self) -> Option<String> {
        let connection = self.connection.as_mut()?;
        match connection.current_database().await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!("Error getting current database: {}", e);
                None
            }
        }
    }

    /// Rebuild the schema of the selected database. Tables that fail to
    /// describe are skipped; table names are lower-cased.
    pub async fn get_schema(&mut self) -> Schema {
        match self.try_get_schema().await {
            Ok(schema) => schema,
            Err(e) => {
                tracing::error!("Error fetching schema: {}", e);
                Schema::new()
            }
        }
    }

    async fn try_get_schema(&mut self) -> Result<Schema, AppError> {
        let mut schema = Schema::new();

        let Some(connection) = self.connection.as_mut() else {
            tracing::warn!("Database connection is not active");
            return Ok(schema);
        };
        connection.ping().await?;

        let Some(current_db) = connection.current_database().await? else {
            tracing::warn!("No database selected");
            return Ok(schema);
        };

        let tables = connection.list_tables().await?;
        if tables.is_empty() {
            tracing::info!("No tables found in database {}", current_db);
            return Ok(schema);
        }

        for table in tables {
            match connection.describe_table(&table).await {
                Ok(columns) => schema.upsert(table.to_lowercase(), columns),
                Err(e) => {
                    tracing::warn!("Error getting columns for table {}: {}", table, e);
                    continue;
                }
            }
        }

        tracing::debug!("Loaded schema for {} ({} tables)", current_db, schema.len());
        Ok(schema)
    }

    /// Run one statement. INSERT/UPDATE/DELETE are committed and report the
    /// affected row count; everything else returns its rows.
    pub async fn execute(&mut self, sql: &str) -> QueryResult {
        self.execute_with_params(sql, &[]).await
    }

    pub async fn execute_with_params(&mut self, sql: &str, params: &[Value]) -> QueryResult {
        match self.try_execute(sql, params).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                QueryResult::Error {
                    message: e.detail().to_string(),
                }
            }
        }
    }

    async fn try_execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult, AppError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| AppError::Connection("No active database connection".to_string()))?;

        if SqlValidator::is_mutation(sql) {
            let count = connection.execute(sql, params).await?;
            tracing::info!("{} row(s) affected", count);
            return Ok(QueryResult::Affected { count });
        }

        let rows = connection.query(sql, params).await?;
        if rows.is_empty() {
            Ok(QueryResult::NoResults)
        } else {
            Ok(QueryResult::Rows { rows })
        }
    }

    /// Release the connection. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                tracing::warn!("{}", e);
            }
            tracing::info!("Database connection closed");
        }
    }

    async fn all_databases(&mut self) -> Result<Vec<String>, AppError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| AppError::Connection("No active database connection".to_string()))?;
        connection.list_databases().await
    }
}
