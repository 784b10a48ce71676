use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chat_with_db::api;
use chat_with_db::config::Config;
use chat_with_db::console::Console;
use chat_with_db::services::database::{DatabaseConnector, MySQLConnector};
use chat_with_db::services::{LlmService, Session, SessionManager, TextGenerator};

#[derive(Parser)]
#[command(name = "chat-with-db", version, about = "Query MySQL in SQL or plain English")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu on stdin/stdout (default)
    Console,
    /// HTTP API with one session per client
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration (also reads .env, so RUST_LOG there applies)
    let config = Config::from_env()?;

    // Initialize logging; stdout belongs to the console menu
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let connector: Arc<dyn DatabaseConnector> = Arc::new(MySQLConnector::new(config.database.clone()));
    let generator: Arc<dyn TextGenerator> = Arc::new(LlmService::new(&config.llm)?);
    if !generator.is_configured() {
        warn!("GROQ_API_KEY is not set; natural language translation is disabled");
    }

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => run_console(&config, connector, generator).await,
        Command::Serve => run_server(&config, connector, generator).await,
    }
}

async fn run_console(
    config: &Config,
    connector: Arc<dyn DatabaseConnector>,
    generator: Arc<dyn TextGenerator>,
) -> anyhow::Result<()> {
    let mut session = Session::open(connector, generator, config.database.name.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to connect to MySQL: {}", e);
            e
        })?;
    session.refresh_schema().await;

    let console = Console::new(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run().await?;
    Ok(())
}

async fn run_server(
    config: &Config,
    connector: Arc<dyn DatabaseConnector>,
    generator: Arc<dyn TextGenerator>,
) -> anyhow::Result<()> {
    let sessions = Arc::new(SessionManager::new(
        connector,
        generator,
        config.database.name.clone(),
    ));

    // Create router with state
    let app = api::routes::create_router_with_state(sessions.clone());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Shutting down, closing {} session(s)", sessions.len().await);
    sessions.close_all().await;
    Ok(())
}
