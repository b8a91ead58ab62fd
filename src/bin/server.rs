use blog_sentinel::config::{ConfigError, ServerConfig};
use blog_sentinel::db::SeaOrmIdentityStore;
use blog_sentinel::logging::init_logging;
use blog_sentinel::shutdown::shutdown_signal;
use blog_sentinel::version::VERSION;
use blog_sentinel::web::{AppState, create_axum_router};
use clap::Parser;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir, "server.log");
    info!("Starting server, version: {}", VERSION);

    let database_url = server_config
        .database_url
        .clone()
        .ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(10).sqlx_logging(false);
    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Failed to connect to the database.");
        e
    })?;

    let identities = Arc::new(SeaOrmIdentityStore::new(db_pool));
    let app_state = Arc::new(AppState::new(server_config.clone(), identities));
    let app = create_axum_router(app_state);

    let listener = tokio::net::TcpListener::bind(&server_config.listen_address).await?;
    info!(address = %server_config.listen_address, "HTTP server listening.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
