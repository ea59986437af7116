use consent_service::config::ConsentConfig;
use consent_service::services::metrics::init_metrics;
use consent_service::services::{
    ConsentMailer, ContentCatalog, LoggingMailer, MongoDb, SmtpMailer, StaticContentCatalog,
};
use consent_service::{build_router, AppState};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ConsentConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Must run before any metric is recorded.
    if let Err(e) = init_metrics() {
        tracing::error!("Failed to install Prometheus recorder: {}", e);
    }

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            std::io::Error::other(format!("Database connection error: {}", e))
        })?;

    db.initialize_indexes().await.map_err(|e| {
        tracing::error!("Failed to initialize database indexes: {}", e);
        std::io::Error::other(format!("Database initialization error: {}", e))
    })?;

    let mailer: Arc<dyn ConsentMailer> = if config.smtp.enabled {
        Arc::new(SmtpMailer::new(&config.smtp).map_err(|e| {
            tracing::error!("Failed to initialize SMTP mailer: {}", e);
            std::io::Error::other(format!("Mailer initialization error: {}", e))
        })?)
    } else {
        tracing::warn!("SMTP disabled; consent and deletion emails will only be logged");
        Arc::new(LoggingMailer)
    };

    let content: Arc<dyn ContentCatalog> = match &config.content.feed_path {
        Some(path) => Arc::new(StaticContentCatalog::from_file(path).await.map_err(|e| {
            tracing::error!("Failed to load content feed from {}: {}", path, e);
            std::io::Error::other(format!("Content feed error: {}", e))
        })?),
        None => Arc::new(StaticContentCatalog::sample()),
    };

    let db = Arc::new(db);
    let state = AppState::new(config.clone(), db.clone(), db, mailer, content);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        e
    })?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Consent service listening on {}",
        addr
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}
