//! signin web server.
//!
//! Wires the Google OAuth2 strategy, the callback binder, and signed session
//! cookies into an axum application.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
