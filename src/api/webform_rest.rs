//! Form protocol endpoints
//!
//! All routes are nested under `/api/webform`:
//! - GET  /{action}/{modelname}[/{mid}] - Begin a form (or resume `fid`)
//! - POST /{action}/{modelname}/validate - Bind and validate
//! - POST /{action}/{modelname}/submit - Perform the validated action
//! - POST /{action}/{modelname}/validate/submit - Validate and submit at once
//! - POST /{action}/{modelname}/validateSingle?propertyName= - Validate one property
//! - POST /{action}/{modelname}/dependents?propertyName= - Choices of dependent members

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{FormConfig, API_BASEPATH};
use crate::services::form::binding::PARAM_PROPERTY_NAME;
use crate::services::form::{FormError, FormParams, FormRequest, SubmitOutcome, SubmitResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{action}/{modelname}", get(begin))
        .route("/{action}/{modelname}/{mid}", get(begin_with_id))
        .route("/{action}/{modelname}/validate", post(validate))
        .route("/{action}/{modelname}/submit", post(submit))
        .route("/{action}/{modelname}/validate/submit", post(validate_submit))
        .route("/{action}/{modelname}/validateSingle", post(validate_single))
        .route("/{action}/{modelname}/dependents", post(dependents))
}

/// Validation failures answer with the form configuration carrying its messages
fn reject(e: FormError) -> Response {
    match e {
        FormError::Validation(config) => (StatusCode::BAD_REQUEST, Json(*config)).into_response(),
        other => ApiError::from(other).into_response(),
    }
}

fn config_response(result: Result<FormConfig, FormError>) -> Response {
    match result {
        Ok(config) => Json(config).into_response(),
        Err(e) => reject(e),
    }
}

fn submit_response(result: Result<SubmitResult, FormError>) -> Response {
    let result = match result {
        Ok(result) => result,
        Err(e) => return reject(e),
    };

    match result.outcome {
        SubmitOutcome::Created { id, entity } => {
            let location = format!("{}/read/{}/{}", API_BASEPATH, result.config.modelname, id);
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(entity)).into_response()
        }
        SubmitOutcome::Read(entity) | SubmitOutcome::Updated(entity) => Json(entity).into_response(),
        SubmitOutcome::Deleted(_) => StatusCode::NO_CONTENT.into_response(),
    }
}

fn property_name(params: &FormParams) -> Result<&str, ApiError> {
    params
        .non_empty(PARAM_PROPERTY_NAME)
        .ok_or_else(|| ApiError::validation_error(format!("Missing parameter {}", PARAM_PROPERTY_NAME)))
}

fn request(action: &str, modelname: &str, mid: Option<&str>, params: &FormParams) -> Result<FormRequest, ApiError> {
    FormRequest::from_params(action, modelname, mid, params).map_err(ApiError::from)
}

async fn begin(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    Ok(config_response(state.form_service.begin(&request).await))
}

async fn begin_with_id(
    State(state): State<AppState>,
    Path((action, modelname, mid)): Path<(String, String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, Some(&mid), &params)?;
    Ok(config_response(state.form_service.begin(&request).await))
}

async fn validate(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    Ok(config_response(state.form_service.validate(&request, &params).await))
}

async fn submit(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    Ok(submit_response(state.form_service.submit(&request, &params).await))
}

async fn validate_submit(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    Ok(submit_response(state.form_service.express(&request, &params).await))
}

async fn validate_single(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    let property = property_name(&params)?;
    Ok(config_response(
        state.form_service.validate_single(&request, &params, property).await,
    ))
}

async fn dependents(
    State(state): State<AppState>,
    Path((action, modelname)): Path<(String, String)>,
    params: FormParams,
) -> Result<Response, ApiError> {
    let request = request(&action, &modelname, None, &params)?;
    let property = property_name(&params)?;
    match state.form_service.dependents(&request, &params, property).await {
        Ok(choices) => Ok(Json(choices).into_response()),
        Err(e) => Ok(reject(e)),
    }
}
