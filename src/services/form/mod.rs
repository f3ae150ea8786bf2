//! Generic form engine
//!
//! Renders, binds, validates and persists any registered model through the
//! staged form protocol:
//! - `begin` resolves a form configuration for `(action, modelname)`
//! - `validate` binds submitted values and checks constraints
//! - `submit` performs the action once the form has validated
//! - `validateSingle` and `dependents` serve per-field interactions
//!
//! `FormEngine` is the capability seam; `FormService` drives the stages and
//! keeps form sessions between requests.

pub mod binding;
pub mod descriptor;
pub mod engine;
pub mod entity;
pub mod service;
pub mod store;
pub mod validation;

pub use binding::{BoundModel, FormParams};
pub use engine::{EntityFormEngine, FormEngine, FormRequest, SubmitOutcome};
pub use service::{FormService, SubmitResult};
pub use store::FormStore;

use crate::models::{FormConfig, FormStage};

/// Error types for form operations
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// No descriptor for the model name
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Action is not create, read, update or delete
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Property is not a field of the model
    #[error("Unknown property '{property}' for model {model}")]
    UnknownProperty { model: String, property: String },

    /// A protocol parameter could not be parsed
    #[error("Invalid value '{value}' for parameter {name}")]
    InvalidParameter { name: String, value: String },

    /// The action needs an entity id
    #[error("Action {0} requires an id")]
    MissingId(String),

    #[error("No {model} found with id {id}")]
    EntityNotFound { model: String, id: i64 },

    /// No live session for the form id
    #[error("Form not found: {0}")]
    FormNotFound(String),

    /// The session was opened for another action or model than the route names
    #[error("Form {fid} is a {form} form, not {route}")]
    SessionMismatch { fid: String, form: String, route: String },

    #[error("Form is at stage {actual:?}, expected {expected:?}")]
    StageOutOfOrder { expected: FormStage, actual: FormStage },

    /// Bound values failed validation; the config carries the messages
    #[error("The form has {} error message(s)", .0.errors.len())]
    Validation(Box<FormConfig>),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
