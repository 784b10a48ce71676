// Menu-driven console front-end
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::api::middleware::AppError;
use crate::models::QueryResult;
use crate::services::export::cell_text;
use crate::services::session::Session;
use crate::validation::SqlValidator;

const MENU: &str = "
=== MySQL Automation Tool ===
1. Execute SQL query
2. Convert natural language to SQL
3. Add test data
4. Update schema information
5. Switch database
6. Exit
";

pub struct Console<R, W> {
    session: Session,
    input: Lines<R>,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input: input.lines(),
            output,
        }
    }

    /// Run the menu until the user exits or input ends. Returns the writer.
    pub async fn run(mut self) -> Result<W, AppError> {
        loop {
            self.write(MENU).await?;
            let Some(choice) = self.prompt("Enter your choice (1-6): ").await? else {
                break;
            };

            match choice.trim() {
                "1" => self.execute_sql().await?,
                "2" => self.natural_language().await?,
                "3" => self.add_test_data().await?,
                "4" => self.update_schema().await?,
                "5" => self.switch_database().await?,
                "6" => break,
                _ => self.writeln("Invalid choice. Please try again.").await?,
            }
        }

        self.session.close().await;
        self.writeln("Goodbye!").await?;
        Ok(self.output)
    }

    async fn execute_sql(&mut self) -> Result<(), AppError> {
        let Some(query) = self.prompt("Enter SQL query: ").await? else {
            return Ok(());
        };
        let result = self.session.execute(&query, &[]).await;
        self.write(&render_result(&result)).await
    }

    async fn natural_language(&mut self) -> Result<(), AppError> {
        let Some(request) = self.prompt("Enter your request in natural language: ").await? else {
            return Ok(());
        };

        let sql = self.session.translate(&request).await;
        self.writeln("\nGenerated SQL Query:").await?;
        self.writeln(&sql).await?;

        if sql.starts_with("Error:") {
            return Ok(());
        }

        let Some(answer) = self.prompt("\nDo you want to execute this query? (y/n): ").await? else {
            return Ok(());
        };
        if !answer.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }

        let result = self.session.execute(&sql, &[]).await;
        self.write(&render_result(&result)).await?;

        if !result.is_error() && SqlValidator::is_schema_change(&sql) {
            self.writeln("Schema updated after table creation.").await?;
        }
        Ok(())
    }

    async fn add_test_data(&mut self) -> Result<(), AppError> {
        self.writeln("Adding test data to USERS table...").await?;
        let result = self.session.add_sample_users().await;
        if result.is_error() {
            return self.write(&render_result(&result)).await;
        }
        self.writeln("Test data added successfully!").await?;
        self.write(&render_result(&result)).await
    }

    async fn update_schema(&mut self) -> Result<(), AppError> {
        self.writeln("Updating schema information...").await?;
        let schema = self.session.refresh_schema().await;

        let mut text = String::from("Current database schema:\n");
        for table in schema.tables() {
            text.push_str(&format!("Table: {}\n", table.name));
            for column in &table.columns {
                text.push_str(&format!("  - {}\n", column));
            }
        }
        self.write(&text).await
    }

    async fn switch_database(&mut self) -> Result<(), AppError> {
        let databases = self.session.list_databases().await;

        let mut text = String::from("\nAvailable databases:\n");
        for (i, name) in databases.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, name));
        }
        self.write(&text).await?;

        let Some(answer) = self.prompt("\nSelect database number: ").await? else {
            return Ok(());
        };
        let Ok(choice) = answer.trim().parse::<usize>() else {
            return self.writeln("Please enter a valid number.").await;
        };
        if choice == 0 || choice > databases.len() {
            return self.writeln("Invalid database selection.").await;
        }

        let selected = &databases[choice - 1];
        if self.session.switch_database(selected).await {
            self.writeln(&format!("Switched to database: {}", selected)).await?;
            self.writeln("Schema updated for the new database.").await
        } else {
            self.writeln(&format!("Failed to switch to database: {}", selected)).await
        }
    }

    async fn prompt(&mut self, text: &str) -> Result<Option<String>, AppError> {
        self.write(text).await?;
        Ok(self.input.next_line().await?)
    }

    async fn write(&mut self, text: &str) -> Result<(), AppError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn writeln(&mut self, text: &str) -> Result<(), AppError> {
        self.write(&format!("{}\n", text)).await
    }
}

/// Text rendering of a result: a bordered table for rows, the message otherwise.
pub fn render_result(result: &QueryResult) -> String {
    let QueryResult::Rows { rows } = result else {
        return format!("{}\n", result);
    };
    let Some(first) = rows.first() else {
        return format!("{}\n", QueryResult::NoResults);
    };

    let headers: Vec<&String> = first.keys().collect();
    let header_row = headers
        .iter()
        .map(|h| h.to_uppercase())
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = "-".repeat(header_row.len());

    let mut out = format!("{separator}\n{header_row}\n{separator}\n");
    for row in rows {
        let line = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(cell_text).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("{separator}\nTotal rows: {}\n", rows.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::testing::FakeConnector;
    use crate::services::translator::testing::StubGenerator;
    use serde_json::json;
    use std::sync::Arc;

    fn shop_connector() -> FakeConnector {
        FakeConnector::with_databases(vec![
            ("shop", vec![("orders", vec!["id", "total"])]),
            ("crm", vec![("contacts", vec!["id", "email"])]),
        ])
    }

    async fn run_script(connector: &FakeConnector, reply: &str, script: &str) -> String {
        let session = Session::open(Arc::new(connector.clone()), StubGenerator::replying(reply), Some("shop"))
            .await
            .unwrap();
        let output = Console::new(session, script.as_bytes(), Vec::new())
            .run()
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_render_rows_table() {
        let result = QueryResult::Rows {
            rows: vec![
                json!({"id": 1, "name": "Vansh"}).as_object().unwrap().clone(),
                json!({"id": 2, "name": null}).as_object().unwrap().clone(),
            ],
        };
        assert_eq!(
            render_result(&result),
            "---------\nID | NAME\n---------\n1 | Vansh\n2 | \n---------\nTotal rows: 2\n"
        );
    }

    #[test]
    fn test_render_messages() {
        assert_eq!(render_result(&QueryResult::Affected { count: 2 }), "2 row(s) affected\n");
        assert_eq!(render_result(&QueryResult::NoResults), "No results found\n");
    }

    #[tokio::test]
    async fn test_exit_and_invalid_choice() {
        let out = run_script(&shop_connector(), "", "9\n6\n").await;
        assert!(out.contains("=== MySQL Automation Tool ==="));
        assert!(out.contains("Invalid choice. Please try again."));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let connector = shop_connector();
        let out = run_script(&connector, "", "").await;
        assert!(out.ends_with("Goodbye!\n"));
        assert_eq!(connector.server.lock().unwrap().open_connections, 0);
    }

    #[tokio::test]
    async fn test_execute_sql_prints_table() {
        let connector = shop_connector();
        connector.server.lock().unwrap().rows.insert(
            "SELECT id, total FROM orders".to_string(),
            vec![json!({"id": 1, "total": 9.5}).as_object().unwrap().clone()],
        );
        let out = run_script(&connector, "", "1\nSELECT id, total FROM orders\n6\n").await;
        assert!(out.contains("ID | TOTAL"));
        assert!(out.contains("1 | 9.5"));
        assert!(out.contains("Total rows: 1"));
    }

    #[tokio::test]
    async fn test_translate_and_execute() {
        let connector = shop_connector();
        let sql = "SELECT id, total FROM orders LIMIT 100";
        connector.server.lock().unwrap().rows.insert(sql.to_string(), vec![]);

        let out = run_script(&connector, sql, "2\nshow orders\ny\n6\n").await;
        assert!(out.contains(&format!("Generated SQL Query:\n{}\n", sql)));
        assert!(out.contains("No results found"));
    }

    #[tokio::test]
    async fn test_translate_error_skips_execution_prompt() {
        let out = run_script(&shop_connector(), "DROP TABLE orders", "2\nremove orders\n6\n").await;
        assert!(out.contains("Error: Generated query contains unsafe operations."));
        assert!(!out.contains("Do you want to execute this query?"));
    }

    #[tokio::test]
    async fn test_update_schema_lists_tables() {
        let out = run_script(&shop_connector(), "", "4\n6\n").await;
        assert!(out.contains("Table: users\n  - id\n  - name\n"));
        assert!(out.contains("Table: orders\n  - id\n  - total\n"));
    }

    #[tokio::test]
    async fn test_switch_database_menu() {
        let out = run_script(&shop_connector(), "", "5\n2\n5\nabc\n5\n7\n6\n").await;
        assert!(out.contains("1. shop\n2. crm\n"));
        assert!(out.contains("Switched to database: crm"));
        assert!(out.contains("Please enter a valid number."));
        assert!(out.contains("Invalid database selection."));
    }
}
