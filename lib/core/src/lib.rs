//! Core domain types and utilities for signin.
//!
//! This crate provides the identifier types and error handling shared by
//! the identity binding library and the web server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
