use identity_service::{
    build_router,
    config::IdentityConfig,
    services::{
        GoogleIdentityProvider, HttpRegistryClient, IdentityService, InMemoryStore,
        InviteTokenService, JwtService, LoggingNotifier,
    },
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

const INVITE_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = IdentityConfig::from_env()?;

    // Initialize tracing/logging using shared logic
    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    let store = Arc::new(InMemoryStore::new());
    tracing::info!("Identity store initialized");

    let registry = Arc::new(
        HttpRegistryClient::new(
            config.registry.company_base_url.clone(),
            config.registry.postal_base_url.clone(),
        )
        .map_err(service_core::error::AppError::InternalError)?,
    );
    tracing::info!("Registry client initialized");

    let federated = Arc::new(
        GoogleIdentityProvider::new(
            config.google.tokeninfo_url.clone(),
            config.google.client_id.clone(),
        )
        .map_err(service_core::error::AppError::InternalError)?,
    );

    let jwt = JwtService::new(&config.jwt)
        .map_err(service_core::error::AppError::InternalError)?;
    tracing::info!("JWT service initialized");

    let notifier = Arc::new(LoggingNotifier);
    let invites = InviteTokenService::new(
        store.clone(),
        notifier.clone(),
        config.invites.default_expiry_days,
    );
    let identity = IdentityService::new(
        store.clone(),
        registry,
        federated,
        invites,
        jwt.clone(),
        notifier,
    );

    // Periodic sweep of unused expired invite tokens
    let cleanup_service = identity.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(INVITE_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_service.cleanup_expired_invites().await {
                tracing::error!(error = %e, "Invite token cleanup failed");
            }
        }
    });

    let state = AppState {
        config: config.clone(),
        jwt,
        identity,
    };
    let app = build_router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
