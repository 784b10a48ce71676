use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// Keyword checks applied to generated SQL before it is handed back to the user.
///
/// This is a best-effort denylist over the raw text, not a parser-backed
/// guarantee. Matching is by substring, so an identifier such as `dropped_at`
/// trips the DROP check, while a second statement after `;` or a tautological
/// `WHERE 1=1` passes.
pub struct SqlValidator;

const FORBIDDEN_KEYWORDS: [&str; 3] = ["DROP", "TRUNCATE", "ALTER"];

const MUTATING_PREFIXES: [&str; 3] = ["INSERT", "UPDATE", "DELETE"];

impl SqlValidator {
    /// True when the statement matches one of the unsafe patterns.
    pub fn is_unsafe(sql: &str) -> bool {
        let upper = sql.trim().to_uppercase();

        if FORBIDDEN_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            return true;
        }

        // UPDATE or DELETE must be scoped by a WHERE clause
        if (upper.starts_with("UPDATE") || upper.starts_with("DELETE")) && !upper.contains("WHERE") {
            return true;
        }

        false
    }

    /// True for statements executed as writes (row count + commit).
    pub fn is_mutation(sql: &str) -> bool {
        let upper = sql.trim().to_uppercase();
        MUTATING_PREFIXES.iter().any(|p| upper.starts_with(p))
    }

    /// True for statements after which the cached schema is stale.
    pub fn is_schema_change(sql: &str) -> bool {
        sql.trim().to_uppercase().starts_with("CREATE TABLE")
    }

    /// Number of statements in `sql` under the MySQL dialect, or None if it does not parse.
    pub fn statement_count(sql: &str) -> Option<usize> {
        let dialect = MySqlDialect {};
        Parser::parse_sql(&dialect, sql).ok().map(|ast| ast.len())
    }
}
