//! Webform - metadata-driven forms over a small blog domain
//!
//! This library provides the form engine, persistence layer, seeding routine
//! and HTTP surface of the Webform service.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
