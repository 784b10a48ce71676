// MySQL adapter: one dedicated connection per executor, no pooling
use crate::api::middleware::AppError;
use crate::config::DatabaseConfig;
use crate::models::Row;
use crate::services::database::adapter::{DatabaseConnection, DatabaseConnector};
use mysql_async::consts::ColumnType;
use mysql_async::{prelude::*, Conn, OptsBuilder, Params, Row as MySqlRow, Value as MySqlValue};
use serde_json::{json, Value};

/// Opens MySQL connections from the `DB_*` settings
pub struct MySQLConnector {
    config: DatabaseConfig,
}

impl MySQLConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn opts(&self, database: Option<&str>) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.config.host.clone())
            .tcp_port(self.config.port)
            .user(Some(self.config.user.clone()))
            .pass(Some(self.config.password.clone()))
            .db_name(database.map(str::to_string))
    }
}

#[async_trait::async_trait]
impl DatabaseConnector for MySQLConnector {
    async fn connect(&self, database: Option<&str>) -> Result<Box<dyn DatabaseConnection>, AppError> {
        tracing::debug!(
            "Connecting to MySQL at {}:{} as {} (database: {:?})",
            self.config.host,
            self.config.port,
            self.config.user,
            database
        );

        let conn = Conn::new(self.opts(database))
            .await
            .map_err(|e| AppError::Connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Box::new(MySQLConnection { conn }))
    }
}

pub struct MySQLConnection {
    conn: Conn,
}

#[async_trait::async_trait]
impl DatabaseConnection for MySQLConnection {
    async fn list_databases(&mut self) -> Result<Vec<String>, AppError> {
        self.conn
            .query("SHOW DATABASES")
            .await
            .map_err(|e| AppError::Connection(format!("Failed to list databases: {}", e)))
    }

    async fn current_database(&mut self) -> Result<Option<String>, AppError> {
        let current: Option<Option<String>> = self
            .conn
            .query_first("SELECT DATABASE()")
            .await
            .map_err(|e| AppError::Connection(format!("Failed to get current database: {}", e)))?;

        Ok(current.flatten())
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, AppError> {
        self.conn
            .query("SHOW TABLES")
            .await
            .map_err(|e| AppError::SchemaIntrospection(format!("Failed to list tables: {}", e)))
    }

    async fn describe_table(&mut self, table: &str) -> Result<Vec<String>, AppError> {
        let query = r#"
            SELECT COLUMN_NAME
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let columns: Vec<String> = self
            .conn
            .exec(query, (table,))
            .await
            .map_err(|e| {
                AppError::SchemaIntrospection(format!("Failed to get columns for table {}: {}", table, e))
            })?;

        if columns.is_empty() {
            return Err(AppError::SchemaIntrospection(format!(
                "Table {} has no visible columns",
                table
            )));
        }

        Ok(columns)
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError> {
        let rows: Vec<MySqlRow> = if params.is_empty() {
            self.conn.query(sql).await?
        } else {
            self.conn.exec(sql, Self::bind(params)).await?
        };

        Ok(rows.into_iter().map(Self::row_to_json).collect())
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, AppError> {
        if params.is_empty() {
            self.conn.query_drop(sql).await?;
        } else {
            self.conn.exec_drop(sql, Self::bind(params)).await?;
        }

        // COMMIT resets the counter, read it first
        let affected = self.conn.affected_rows();
        self.conn.query_drop("COMMIT").await?;

        Ok(affected)
    }

    async fn ping(&mut self) -> Result<(), AppError> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Connection(format!("Connection is not active: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<(), AppError> {
        self.conn
            .disconnect()
            .await
            .map_err(|e| AppError::Connection(format!("Failed to close connection: {}", e)))
    }
}

impl MySQLConnection {
    fn bind(params: &[Value]) -> Params {
        Params::Positional(params.iter().map(Self::json_to_mysql_value).collect())
    }

    fn json_to_mysql_value(value: &Value) -> MySqlValue {
        match value {
            Value::Null => MySqlValue::NULL,
            Value::Bool(b) => MySqlValue::Int(*b as i64),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MySqlValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    MySqlValue::UInt(u)
                } else {
                    MySqlValue::Double(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => MySqlValue::Bytes(s.clone().into_bytes()),
            other => MySqlValue::Bytes(other.to_string().into_bytes()),
        }
    }

    fn row_to_json(row: MySqlRow) -> Row {
        let mut row_obj = Row::new();
        let columns = row.columns_ref();

        for (idx, column) in columns.iter().enumerate() {
            let value = match row.as_ref(idx) {
                Some(mysql_val) => Self::mysql_value_to_json(mysql_val.clone(), column.column_type()),
                None => Value::Null,
            };
            row_obj.insert(column.name_str().to_string(), value);
        }

        row_obj
    }

    /// Text-protocol results arrive as bytes, so numeric columns are parsed back using the column type
    fn mysql_value_to_json(mysql_val: MySqlValue, column_type: ColumnType) -> Value {
        match mysql_val {
            MySqlValue::NULL => Value::Null,
            MySqlValue::Bytes(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                Self::typed_text_to_json(text, column_type)
            }
            MySqlValue::Int(i) => json!(i),
            MySqlValue::UInt(u) => json!(u),
            MySqlValue::Float(f) => json!(f),
            MySqlValue::Double(d) => json!(d),
            MySqlValue::Date(y, m, d, h, min, s, _) => {
                json!(format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, m, d, h, min, s))
            }
            MySqlValue::Time(is_neg, d, h, m, s, _) => {
                let sign = if is_neg { "-" } else { "" };
                let total_hours = d * 24 + h as u32;
                json!(format!("{}{}:{:02}:{:02}", sign, total_hours, m, s))
            }
        }
    }

    fn typed_text_to_json(text: String, column_type: ColumnType) -> Value {
        match column_type {
            ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONGLONG
            | ColumnType::MYSQL_TYPE_YEAR => {
                if let Ok(i) = text.parse::<i64>() {
                    json!(i)
                } else if let Ok(u) = text.parse::<u64>() {
                    json!(u)
                } else {
                    json!(text)
                }
            }
            ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => match text.parse::<f64>() {
                Ok(f) => json!(f),
                Err(_) => json!(text),
            },
            // DECIMAL stays textual to keep its precision
            _ => json!(text),
        }
    }
}
