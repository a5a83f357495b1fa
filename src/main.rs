use love_unfolds::{
    config::Config,
    errors::AppError,
    routes::create_router,
    startup::{connect_store, serve, shutdown_signal},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "love_unfolds=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Config::load()?;
    tracing::info!(?config, "Configuration loaded");

    // --- Store Connection ---
    let moment_repo = connect_store(&config).await?;
    let state = AppState::new(moment_repo.clone());

    // --- Router Definition ---
    let app = create_router(state, &config.allowed_origins);

    // --- Server Startup ---
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .map_err(|e| AppError::InitError(format!("Failed to bind {}: {}", config.bind_address, e)))?;
    tracing::info!("Server running on http://{}", config.bind_address);

    // --- Serve, then disconnect the store ---
    serve(listener, app, moment_repo, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}
