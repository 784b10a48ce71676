// Database adapter traits, the seam between the query executor and the driver
use crate::api::middleware::AppError;
use crate::models::Row;
use serde_json::Value;

/// Opens connections, optionally scoped to one database
#[async_trait::async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, database: Option<&str>) -> Result<Box<dyn DatabaseConnection>, AppError>;
}

/// One live database connection
#[async_trait::async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// All database names visible to the user, system schemas included
    async fn list_databases(&mut self) -> Result<Vec<String>, AppError>;

    /// The selected database, if any
    async fn current_database(&mut self) -> Result<Option<String>, AppError>;

    /// Table names in the selected database
    async fn list_tables(&mut self) -> Result<Vec<String>, AppError>;

    /// Column names of `table` in ordinal order
    async fn describe_table(&mut self, table: &str) -> Result<Vec<String>, AppError>;

    /// Run a statement and fetch all rows
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError>;

    /// Run a write statement, commit, and return the affected row count
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, AppError>;

    async fn ping(&mut self) -> Result<(), AppError>;

    async fn close(self: Box<Self>) -> Result<(), AppError>;
}
