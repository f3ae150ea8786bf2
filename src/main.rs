//! Webform - metadata-driven forms over a small blog domain

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webform::{
    api::{self, AppState, ViewRenderer},
    config::Config,
    db::{self, repositories::RepositoryFactory},
    services::{
        form::{EntityFormEngine, FormService, FormStore},
        seed::{Environment, SampleDataLoader},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webform=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Webform...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations and register enum values
    db::prepare(&pool).await?;
    tracing::info!("Database migrations completed");

    let factory = Arc::new(RepositoryFactory::new(pool.clone()));
    let environment = Environment::from_profiles(Some(config.profiles.active.as_slice()));
    tracing::info!(
        "Active profiles: {:?} (production: {})",
        environment.profiles(),
        environment.is_production_environment()
    );

    // Seed reference data before accepting requests
    SampleDataLoader::new(
        factory.clone(),
        environment.clone(),
        config.seed.subtypes_per_type,
        config.server.port,
    )
    .run()
    .await?;

    // Initialize services
    let engine = EntityFormEngine::boxed(factory.clone(), config.forms.max_choices);
    let store = Arc::new(FormStore::new(
        Duration::from_secs(config.forms.session_ttl_seconds),
        config.forms.max_sessions,
    ));
    let state = AppState {
        form_service: Arc::new(FormService::new(engine, store)),
        views: Arc::new(ViewRenderer::new()?),
        environment: Arc::new(environment),
    };

    let app = api::build_router(state, &config.server.static_dir);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    factory.close();
    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
