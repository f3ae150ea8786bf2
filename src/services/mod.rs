//! Services layer - Business logic
//!
//! This module contains the business logic of the Webform service:
//! - `seed` loads the reference data at startup
//! - `form` implements the generic form engine and its staged protocol

pub mod form;
pub mod seed;

pub use form::{EntityFormEngine, FormEngine, FormError, FormParams, FormRequest, FormService, FormStore};
pub use seed::{Environment, SampleDataLoader, SeedError};
