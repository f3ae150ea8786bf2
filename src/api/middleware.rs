//! API state and error responses
//!
//! Contains:
//! - `AppState`, the shared services handed to every handler
//! - `ApiError`, the JSON error body and its status mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::views::ViewRenderer;
use crate::services::form::{FormError, FormService};
use crate::services::seed::Environment;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub form_service: Arc<FormService>,
    pub views: Arc<ViewRenderer>,
    pub environment: Arc<Environment>,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn stage_out_of_order(message: impl Into<String>) -> Self {
        Self::new("STAGE_OUT_OF_ORDER", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" | "STAGE_OUT_OF_ORDER" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        let message = e.to_string();
        match e {
            FormError::UnknownModel(_)
            | FormError::UnknownAction(_)
            | FormError::EntityNotFound { .. }
            | FormError::FormNotFound(_) => Self::not_found(message),
            FormError::UnknownProperty { .. }
            | FormError::InvalidParameter { .. }
            | FormError::MissingId(_) => Self::validation_error(message),
            FormError::StageOutOfOrder { .. } => Self::stage_out_of_order(message),
            FormError::SessionMismatch { .. } => Self::new("CONFLICT", message),
            FormError::Validation(config) => match serde_json::to_value(&*config) {
                Ok(details) => Self::with_details("VALIDATION_ERROR", message, details),
                Err(_) => Self::validation_error(message),
            },
            FormError::Internal(e) => {
                tracing::error!("Form operation failed: {:#}", e);
                Self::internal_error("Internal server error")
            }
        }
    }
}
