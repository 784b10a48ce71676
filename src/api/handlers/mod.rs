pub mod database;
pub mod query;
pub mod session;
