use crate::api::middleware::AppError;
use crate::models::Schema;
use crate::services::llm_service::{TextGenerator, MISSING_API_KEY_MESSAGE};
use crate::validation::SqlValidator;
use std::sync::Arc;

pub const NO_SCHEMA_MESSAGE: &str =
    "No schema information available. Please ensure you have selected a database and it contains tables.";
pub const UNSAFE_QUERY_MESSAGE: &str =
    "Generated query contains unsafe operations. Please rephrase your request.";

/// Natural-language to SQL translator.
///
/// Builds a schema-aware prompt, asks the text generator for one statement,
/// and rejects candidates that match the [`SqlValidator::is_unsafe`] denylist.
pub struct SqlTranslator {
    schema: Schema,
    generator: Arc<dyn TextGenerator>,
}

impl SqlTranslator {
    /// New translator seeded with the `users` sample table.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_schema(generator, Self::seed_schema())
    }

    pub fn with_schema(generator: Arc<dyn TextGenerator>, schema: Schema) -> Self {
        Self { schema, generator }
    }

    fn seed_schema() -> Schema {
        [("users", vec!["id", "name"])].into_iter().collect()
    }

    /// Insert or replace the columns known for `table_name`.
    pub fn update_schema(&mut self, table_name: impl Into<String>, columns: Vec<String>) {
        self.schema.upsert(table_name, columns);
    }

    pub fn replace_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Translate `request` into SQL, or a message starting with `"Error: "`.
    pub async fn translate(&self, request: &str) -> String {
        match self.generate_sql(request).await {
            Ok(sql) => sql,
            Err(AppError::TranslationUpstream(msg)) => format!("Error: Failed to generate SQL query: {}", msg),
            Err(e) => format!("Error: {}", e.detail()),
        }
    }

    /// Same pipeline as [`translate`](Self::translate) with a typed error.
    pub async fn generate_sql(&self, request: &str) -> Result<String, AppError> {
        let schema_context = self.schema_context();
        if schema_context.is_empty() {
            return Err(AppError::TranslationConfig(NO_SCHEMA_MESSAGE.to_string()));
        }

        if !self.generator.is_configured() {
            return Err(AppError::TranslationConfig(MISSING_API_KEY_MESSAGE.to_string()));
        }

        let prompt = Self::build_prompt(&schema_context, request);
        tracing::info!("Generating SQL for request: {}", request);

        let sql = self.generator.generate(&prompt).await?.trim().to_string();

        if SqlValidator::is_unsafe(&sql) {
            tracing::warn!("Rejected generated query: {}", sql);
            return Err(AppError::UnsafeQuery(UNSAFE_QUERY_MESSAGE.to_string()));
        }

        match SqlValidator::statement_count(&sql) {
            Some(1) => {}
            Some(n) => tracing::warn!("Generated SQL contains {} statements: {}", n, sql),
            None => tracing::warn!("Generated SQL did not parse as MySQL: {}", sql),
        }

        tracing::info!("Generated SQL: {}", sql);
        Ok(sql)
    }

    /// Schema block for the prompt, empty when no tables are known.
    pub fn schema_context(&self) -> String {
        if self.schema.is_empty() {
            return String::new();
        }

        let mut context = String::from("Current Database Schema:\n\n");
        for table in self.schema.tables() {
            context.push_str(&format!("Table: `{}`\n", table.name));
            context.push_str("Columns:\n");
            for column in &table.columns {
                context.push_str(&format!("  - {}\n", column));
            }
            context.push('\n');
        }
        context
    }

    pub fn build_prompt(schema_context: &str, request: &str) -> String {
        format!(
            r#"
You are a helpful and secure SQL assistant. Your task is to convert natural language into safe and correct MySQL queries that follow standard CRUD patterns.

DATABASE SCHEMA:
{schema_context}

RULES:
- Generate only ONE SQL query - no extra text, comments, or explanations
- Do NOT generate DROP, TRUNCATE, or ALTER statements
- Do NOT generate DELETE or UPDATE queries without a WHERE clause
- Do NOT use * in SELECT statements; select specific columns
- LIMIT large result sets (default to LIMIT 100 if not specified)
- Ensure the query is syntactically correct for MySQL
- Use the exact table and column names as shown in the schema

USER REQUEST: {request}

SQL QUERY:
"#
        )
    }
}
