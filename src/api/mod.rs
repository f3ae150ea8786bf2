//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP surface of the Webform service:
//! - Landing page
//! - Form page for the browser form client
//! - Form protocol endpoints under `/api/webform`
//! - Static bundle files from the configured directory

pub mod index;
pub mod middleware;
pub mod params;
pub mod views;
pub mod webform;
pub mod webform_rest;

use axum::Router;
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::models::API_BASEPATH;

pub use middleware::{ApiError, AppState};
pub use views::{View, ViewRenderer};

/// Build the complete router with middleware
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(index::router())
        .merge(webform::router())
        .nest(API_BASEPATH, webform_rest::router())
        // Form client bundles and images
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router over a seeded in-memory database
#[cfg(test)]
pub(crate) async fn build_test_server(production: bool) -> axum_test::TestServer {
    build_test_server_with_static(production, &std::env::temp_dir()).await
}

#[cfg(test)]
pub(crate) async fn build_test_server_with_static(production: bool, static_dir: &Path) -> axum_test::TestServer {
    use crate::db::{create_prepared_test_pool, repositories::RepositoryFactory};
    use crate::services::form::{EntityFormEngine, FormService, FormStore};
    use crate::services::seed::{Environment, SampleDataLoader};
    use std::sync::Arc;
    use std::time::Duration;

    let profiles = vec![if production { "prod" } else { "dev" }.to_string()];
    let environment = Environment::from_profiles(Some(profiles.as_slice()));
    let factory = Arc::new(RepositoryFactory::new(create_prepared_test_pool().await));
    SampleDataLoader::new(factory.clone(), environment.clone(), 2, 8080)
        .load_default_data()
        .await
        .unwrap();

    let engine = EntityFormEngine::boxed(factory, 1000);
    let store = Arc::new(FormStore::new(Duration::from_secs(60), 100));
    let state = AppState {
        form_service: Arc::new(FormService::new(engine, store)),
        views: Arc::new(ViewRenderer::new().unwrap()),
        environment: Arc::new(environment),
    };

    axum_test::TestServer::new(build_router(state, static_dir)).unwrap()
}
