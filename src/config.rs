use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database selected right after connecting, if any
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // .env values only fill variables that are not already set
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("database.host", "localhost")?
            .set_default("database.port", 3306)?
            .set_default("database.user", "root")?
            .set_default("database.password", "")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default(
                "llm.api_url",
                "https://api.groq.com/openai/v1/chat/completions",
            )?
            .set_default("llm.model", "llama-3.3-70b-versatile")?
            .set_default("llm.temperature", 0.1)?
            .set_default("llm.max_tokens", 200)?
            .set_default("logging.level", "info")?;

        if let Ok(host) = env::var("DB_HOST") {
            builder = builder.set_override("database.host", host)?;
        }

        if let Ok(port) = env::var("DB_PORT") {
            builder = builder.set_override("database.port", port.parse::<u16>().unwrap_or(3306))?;
        }

        if let Ok(user) = env::var("DB_USER") {
            builder = builder.set_override("database.user", user)?;
        }

        if let Ok(password) = env::var("DB_PASSWORD") {
            builder = builder.set_override("database.password", password)?;
        }

        if let Ok(name) = env::var("DB_NAME") {
            if !name.trim().is_empty() {
                builder = builder.set_override("database.name", Some(name))?;
            }
        }

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(3000))?;
        }

        if let Ok(api_url) = env::var("GROQ_API_URL") {
            builder = builder.set_override("llm.api_url", api_url)?;
        }

        if let Ok(api_key) = env::var("GROQ_API_KEY") {
            if !api_key.trim().is_empty() {
                builder = builder.set_override("llm.api_key", Some(api_key))?;
            }
        }

        if let Ok(model) = env::var("GROQ_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
