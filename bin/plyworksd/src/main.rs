//! `plyworksd` — the Plyworks press server binary.
//!
//! Usage:
//!   plyworksd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/plyworks/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod actor_middleware;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use plyworks_core::Module;
use tracing::info;

use config::ServerConfig;

/// Plyworks press server.
#[derive(Parser, Debug)]
#[command(name = "plyworksd", about = "Plyworks press server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    let listen = cli
        .listen
        .unwrap_or_else(|| server_config.server.listen.clone());

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = plyworks_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: listen.clone(),
        ..Default::default()
    };

    // Initialize the embedded store (shared by all modules).
    let sql: Arc<dyn plyworks_sql::SQLStore> = Arc::new(
        plyworks_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // Identity comes from gateway-set headers; the resolver is pluggable
    // so deployments with a different edge can swap it out.
    let resolver: Arc<dyn plyworks_core::ActorResolver> =
        Arc::new(plyworks_core::HeaderResolver::with_headers(
            server_config.auth.id_header.clone(),
            server_config.auth.role_header.clone(),
            server_config.auth.scope_header.clone(),
        ));

    let press_module = press::PressModule::new(
        Arc::clone(&sql),
        Arc::new(plyworks_core::SystemClock),
        Arc::new(press::notify::LogNotifier),
    )?;
    info!("Press module initialized");

    let module_routes = vec![(press_module.name(), press_module.routes())];

    // Build router.
    let app = routes::build_router(resolver, module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("Plyworks server listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}
