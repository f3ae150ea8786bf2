//! Data models
//!
//! This module contains the data structures used throughout the Webform service:
//! - Domain entities (Blog, BlogSubtype, BlogType, Post)
//! - Form protocol types exchanged with the browser form client

mod blog;
mod blog_subtype;
mod blog_type;
mod form;
mod post;

pub use blog::Blog;
pub use blog_subtype::BlogSubtype;
pub use blog_type::BlogType;
pub use form::{
    indexed_messages, Choice, FieldError, Form, FormAction, FormConfig, FormMember, FormStage,
    API_BASEPATH, BASEPATH, ERRORS_HEADER, TEMPLATE_PAGE,
};
pub use post::Post;
