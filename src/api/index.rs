//! Landing page
//!
//! - GET / - Render the `index` view

use axum::{extract::State, response::Html, routing::get, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::api::views::View;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let view = View::new("index").with("script", state.environment.bundle_script());
    state.views.render(&view).map_err(|e| {
        tracing::error!("Failed to render index: {:#}", e);
        ApiError::internal_error("Failed to render page")
    })
}
