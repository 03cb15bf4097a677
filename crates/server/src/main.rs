//! Polling server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use polling_api::{AppState, auth_middleware, router as api_router};
use polling_common::Config;
use polling_core::{PollResultService, PollService, RoleService, UserService, VoteService};
use polling_db::repositories::{PollRepository, PollVoteRepository, RoleRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polling=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting polling server...");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    let timezone = config.polling.tz()?;

    // Connect to database
    let db = polling_db::init(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    polling_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let role_repo = RoleRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = PollVoteRepository::new(Arc::clone(&db));

    // One-time role provisioning
    RoleService::new(role_repo, config.polling.polling_user_role.clone())
        .ensure_polling_user_role()
        .await?;

    let user_service = UserService::new(user_repo);
    if let Some(username) = &config.polling.bootstrap_admin {
        if let Some(admin) = user_service.ensure_admin(username).await? {
            warn!(
                username = %admin.username,
                token = admin.token.as_deref().unwrap_or_default(),
                "Bootstrap administrator created; store this token now"
            );
        }
    }

    // Initialize services
    let state = AppState {
        user_service,
        poll_service: PollService::new(poll_repo.clone()),
        vote_service: VoteService::new(poll_repo.clone(), vote_repo).with_timezone(timezone),
        result_service: PollResultService::new(poll_repo),
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.host))?;
    info!(%addr, %timezone, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
