//! Form page controller
//!
//! Serves the page the browser form client mounts on:
//! - GET /webform?action=&modelname=
//! - GET /webform/{action}/{modelname}
//!
//! The client only receives the base paths once it knows both what to do
//! and which model to do it on.

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::api::views::View;
use crate::models::{API_BASEPATH, BASEPATH, TEMPLATE_PAGE};
use crate::services::form::binding::FORM_PARAMS;
use crate::services::form::FormParams;
use crate::services::seed::Environment;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(BASEPATH, get(webform_by_query))
        .route(&format!("{}/{{action}}/{{modelname}}", BASEPATH), get(webform_by_path))
}

/// Build the form page view.
///
/// `basepath`, `apibasepath` and the form parameters are added only when
/// both `action` and `modelname` are non-empty.
pub fn display_form(
    environment: &Environment,
    action: Option<&str>,
    modelname: Option<&str>,
    query: &FormParams,
) -> View {
    let mut view = View::new(TEMPLATE_PAGE).with("script", environment.bundle_script());

    let action = action.filter(|s| !s.is_empty());
    let modelname = modelname.filter(|s| !s.is_empty());
    if let Some(action) = action {
        view = view.with("action", action);
    }
    if let Some(modelname) = modelname {
        view = view.with("modelname", modelname);
    }

    if action.is_some() && modelname.is_some() {
        view = view.with("basepath", BASEPATH).with("apibasepath", API_BASEPATH);
        for name in FORM_PARAMS {
            if let Some(value) = query.non_empty(name) {
                view = view.with(*name, value);
            }
        }
    }
    view
}

fn render(state: &AppState, view: &View) -> Result<Html<String>, ApiError> {
    state.views.render(view).map_err(|e| {
        tracing::error!("Failed to render form page: {:#}", e);
        ApiError::internal_error("Failed to render page")
    })
}

fn query_params(pairs: Vec<(String, String)>) -> FormParams {
    pairs.into_iter().collect()
}

async fn webform_by_query(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let query = query_params(pairs);
    let view = display_form(
        &state.environment,
        query.get("action"),
        query.get("modelname"),
        &query,
    );
    render(&state, &view)
}

async fn webform_by_path(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let query = query_params(pairs);
    let view = display_form(&state.environment, Some(&action), Some(&modelname), &query);
    render(&state, &view)
}
