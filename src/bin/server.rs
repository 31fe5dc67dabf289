use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dotask::db::{MemoryStore, PgStore, Store, pg_store};
use dotask::graphql::{CookiePolicy, build_schema};
use dotask::server::config::{ServerConfig, StoreKind};
use dotask::services::CredentialService;
use dotask::web::create_axum_router;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

async fn open_store(config: &ServerConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error + Send + Sync>> {
    match config.store {
        StoreKind::Postgres => {
            let pool = pg_store::connect(config).await?;
            pg_store::run_migrations(&pool).await?;
            info!("Connected to Postgres and applied migrations.");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreKind::Memory => {
            warn!("Using the in-memory store; all data is lost on shutdown.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // A missing JWT_SECRET aborts startup here.
    let server_config = Arc::new(ServerConfig::load(args.config.as_deref())?);

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting server.");

    let store = match open_store(&server_config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to open the data store.");
            return Err(e);
        }
    };

    let credentials = Arc::new(CredentialService::from_config(&server_config));
    let schema = build_schema(
        store,
        credentials.clone(),
        CookiePolicy {
            secure: server_config.cookie_secure,
        },
    );
    let app = create_axum_router(schema, credentials, server_config.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server is running; GraphQL playground available at /.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
