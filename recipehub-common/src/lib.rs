//! # RecipeHub Common Library
//!
//! Shared code for RecipeHub services:
//! - Error type
//! - Bootstrap configuration and root folder resolution
//! - Tracing setup
//! - Database initialization and migrations

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
