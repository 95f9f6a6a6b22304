//! API Gateway for the fund ledger

use std::sync::Arc;

use api_gateway::config::{AppConfig, StoreKind};
use api_gateway::{router, AppState};
use clap::Parser;
use common::store::{InMemoryKeyValueStore, KeyValueStore, PostgresKeyValueStore};
use dotenv::dotenv;
use ledger_service::{
    EventPublisher, FundCatalog, LedgerService, NotificationDispatcher, NotificationService,
    Repositories,
};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Fund ledger API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address; defaults to 127.0.0.1:$PORT
    #[clap(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse_lossy("tower_http=debug,api_gateway=debug,ledger_service=info");

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Debug logging enabled");

    let config = AppConfig::new();

    // Store backend
    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreKind::Memory => {
            info!("Using in-memory store");
            Arc::new(InMemoryKeyValueStore::new())
        }
        StoreKind::Postgres => Arc::new(
            PostgresKeyValueStore::connect(
                &config.ledger.database_url,
                config.ledger.db_pool_size,
                &config.ledger.table_name,
            )
            .await?,
        ),
    };
    let repos = Repositories::from_store(store);
    let catalog = FundCatalog::load(config.ledger.fund_catalog_path.as_deref())?;

    // Notifications run off the request path
    let (publisher, events) = EventPublisher::channel();
    let notifications = NotificationService::with_config(repos.clients.clone(), &config.notifications);
    let dispatcher = NotificationDispatcher::new(Arc::new(notifications)).spawn(events);

    let ledger = LedgerService::from_parts(repos, catalog, publisher)
        .with_max_write_attempts(config.ledger.max_write_attempts);

    if config.initialize_on_start {
        let report = ledger.initialize().await?;
        info!("Loaded {} funds on startup", report.funds_loaded);
    }

    let state = Arc::new(AppState {
        ledger: Arc::new(ledger),
    });
    let app = router(state, log_level);

    // Start the server
    let addr: std::net::SocketAddr = args
        .addr
        .unwrap_or_else(|| format!("127.0.0.1:{}", config.port))
        .parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last publisher; let pending notifications drain
    if let Err(e) = dispatcher.await {
        tracing::warn!("Notification dispatcher ended abnormally: {}", e);
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
