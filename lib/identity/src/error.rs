//! Error types for the identity crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StoreError`: Failures reported by a `UserStore` implementation
//! - `BindError`: Failures of the callback binder, wrapping store failures

use std::fmt;

/// Errors from user persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable { reason: String },
    /// A query against the store failed.
    Query { operation: String, reason: String },
    /// A stored record could not be decoded into a `User`.
    Decode { reason: String },
    /// A user with the same provider identity already exists.
    Conflict {
        provider: String,
        provider_id: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "user store unavailable: {reason}")
            }
            Self::Query { operation, reason } => {
                write!(f, "user store query '{operation}' failed: {reason}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to decode user record: {reason}")
            }
            Self::Conflict {
                provider,
                provider_id,
            } => {
                write!(f, "user already exists for {provider} id {provider_id}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from binding a provider identity to a local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The persistence layer failed during lookup or creation.
    Persistence { operation: &'static str },
    /// The provider profile cannot identify a user.
    InvalidProfile { reason: String },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence { operation } => {
                write!(f, "persistence failure during {operation}")
            }
            Self::InvalidProfile { reason } => {
                write!(f, "invalid provider profile: {reason}")
            }
        }
    }
}

impl std::error::Error for BindError {}
