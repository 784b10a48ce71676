use serde::{Deserialize, Serialize};
use std::fmt;

/// One result row: column name to scalar value, in server column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome of executing one SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    Rows { rows: Vec<Row> },
    NoResults,
    Affected { count: u64 },
    Error { message: String },
}

impl QueryResult {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error { .. })
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows { rows } => Some(rows),
            _ => None,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows { rows } => write!(f, "{} row(s) returned", rows.len()),
            QueryResult::NoResults => f.write_str("No results found"),
            QueryResult::Affected { count } => write!(f, "{} row(s) affected", count),
            QueryResult::Error { message } => write!(f, "Error executing query: {}", message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Positional parameters bound by the driver
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct NaturalLanguageQueryRequest {
    pub question: String,
    #[serde(default)]
    pub execute: bool,
}

#[derive(Debug, Deserialize)]
pub struct SwitchDatabaseRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_messages() {
        assert_eq!(QueryResult::Affected { count: 3 }.to_string(), "3 row(s) affected");
        assert_eq!(QueryResult::NoResults.to_string(), "No results found");
        assert_eq!(
            QueryResult::Error { message: "Table 'x' doesn't exist".into() }.to_string(),
            "Error executing query: Table 'x' doesn't exist"
        );
    }

    #[test]
    fn test_tagged_serialization() {
        let value = serde_json::to_value(QueryResult::Affected { count: 1 }).unwrap();
        assert_eq!(value, json!({"kind": "affected", "count": 1}));

        let value = serde_json::to_value(QueryResult::NoResults).unwrap();
        assert_eq!(value, json!({"kind": "no_results"}));
    }

    #[test]
    fn test_query_request_params_default() {
        let req: QueryRequest = serde_json::from_value(json!({"query": "SELECT 1"})).unwrap();
        assert!(req.params.is_empty());
    }
}
