// Database abstraction layer: connector/connection traits and the MySQL driver
pub mod adapter;
pub mod mysql;

pub use adapter::{DatabaseConnection, DatabaseConnector};
pub use mysql::{MySQLConnection, MySQLConnector};

/// Schemas hidden from database listings
pub const SYSTEM_DATABASES: [&str; 4] = ["information_schema", "performance_schema", "mysql", "sys"];

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name)
}
