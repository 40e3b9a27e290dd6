use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_web::{config::Config, route::create_router, store, AppState};

// Entry point of the application
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_web=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = store::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    tracing::info!("connection to the database is successful");

    store::init_schema(&pool)
        .await
        .context("failed to create tables")?;

    let app_state = Arc::new(AppState::new(pool, &config));

    // Configure CORS for the browser front end
    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    let app = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.listen_addr();
    tracing::info!(%addr, "server started");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
