//! # Fabula Common Library
//!
//! Shared code for the Fabula services:
//! - Database schema, migrations, queries
//! - Configuration loading and root folder resolution
//! - Password hashing
//! - Slug generation and LIKE-pattern escaping

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod slug;

pub use error::{Error, Result};
