//! Identity-provider callback binding for signin.
//!
//! This crate provides:
//! - The local `User` record bound to a provider identity
//! - `ProviderProfile` and `ProviderTokens` handed over by an OAuth2 strategy
//! - The `UserStore` persistence trait and an in-memory implementation
//! - `OAuthBinder`, which performs find-or-create on login and maps users to
//!   and from the `SessionPrincipal` stored in the session
//!
//! # Example
//!
//! ```
//! use signin_identity::{
//!     InMemoryUserStore, OAuthBinder, ProviderProfile, ProviderTokens,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let binder = OAuthBinder::new(Arc::new(InMemoryUserStore::new()));
//!
//! let profile = ProviderProfile::new("google".to_string(), "1093".to_string())
//!     .with_display_name(Some("Ada Lovelace".to_string()));
//! let tokens = ProviderTokens::new("ya29.token".to_string());
//!
//! let outcome = binder.verify(&tokens, &profile).await.unwrap();
//! assert!(outcome.created);
//!
//! let principal = binder.serialize_user(&outcome.user);
//! let user = binder.deserialize_user(&principal).await.unwrap();
//! assert_eq!(user.map(|u| u.id()), Some(outcome.user.id()));
//! # });
//! ```

pub mod binder;
pub mod error;
pub mod profile;
pub mod session;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use binder::{BindOutcome, OAuthBinder};
pub use error::{BindError, StoreError};
pub use profile::{ProviderProfile, ProviderTokens};
pub use session::{Session, SessionPrincipal};
pub use store::{InMemoryUserStore, UserStore};
pub use user::User;
