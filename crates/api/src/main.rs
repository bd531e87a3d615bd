use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallery_api::config::ServerConfig;
use wallery_api::router::build_app_router;
use wallery_api::state::AppState;
use wallery_pipeline::{PgCatalog, PipelineConfig, UploadPipeline};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wallery_api=debug,wallery_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| fail_startup(&e));
    let pipeline_config = PipelineConfig::from_env().unwrap_or_else(|e| fail_startup(&e));
    tracing::info!(
        host = %config.host,
        port = %config.port,
        analysis_mode = %pipeline_config.analysis_mode,
        require_name = pipeline_config.require_name,
        "Loaded configuration"
    );

    // --- Database ---
    let pool = wallery_db::create_pool(&config.database_url)
        .await
        .unwrap_or_else(|e| fail_startup(&e));
    tracing::info!("Database connection pool created");

    wallery_db::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| fail_startup(&e));
    tracing::info!("Database migrations applied");

    // --- Pipeline ---
    let catalog = Arc::new(PgCatalog::new(pool));
    let pipeline = UploadPipeline::from_config(&pipeline_config, catalog)
        .unwrap_or_else(|e| fail_startup(&e));

    // --- Router ---
    let ip: IpAddr = config.host.parse().unwrap_or_else(|e| fail_startup(&e));
    let addr = SocketAddr::new(ip, config.port);
    let app = build_app_router(AppState::new(pipeline, config));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| fail_startup(&e));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Graceful shutdown complete");
}

/// Log a startup failure and exit.
fn fail_startup(err: &dyn std::error::Error) -> ! {
    tracing::error!(error = %err, "Startup failed");
    std::process::exit(1);
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
