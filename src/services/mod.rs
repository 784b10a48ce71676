pub mod database; // MySQL connector and connection traits
pub mod db_service;
pub mod export;
pub mod llm_service;
pub mod session;
pub mod translator;

pub use db_service::DbService;
pub use llm_service::{LlmService, TextGenerator};
pub use session::{Session, SessionManager};
pub use translator::SqlTranslator;
