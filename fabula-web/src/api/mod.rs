//! HTTP handlers for fabula-web

pub mod assets;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod novels_admin;
pub mod pages;
pub mod series_admin;
