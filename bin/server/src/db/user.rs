//! Postgres-backed user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use signin_core::UserId;
use signin_identity::{StoreError, User, UserStore};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    provider: String,
    provider_id: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, Report<StoreError>> {
        let id = UserId::from_str(&self.id).map_err(|e| StoreError::Decode {
            reason: format!("invalid user id '{}': {}", self.id, e),
        })?;
        Ok(User::with_all_fields(
            id,
            self.provider,
            self.provider_id,
            self.display_name,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// User store backed by the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new user store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Classifies a driver error for the store's callers.
fn store_error(operation: &str, error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable {
                reason: error.to_string(),
            }
        }
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => StoreError::Decode {
            reason: error.to_string(),
        },
        _ => StoreError::Query {
            operation: operation.to_string(),
            reason: error.to_string(),
        },
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, provider, provider_id, display_name, created_at, updated_at
            FROM users
            WHERE provider = $1 AND provider_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_by_provider_id", e))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, provider, provider_id, display_name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_by_id", e))?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
        sqlx::query(
            r#"
            INSERT INTO users (id, provider, provider_id, display_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.provider())
        .bind(user.provider_id())
        .bind(user.display_name())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The unique index on (provider, provider_id) settles concurrent first logins
            if is_unique_violation(&e) {
                StoreError::Conflict {
                    provider: user.provider().to_string(),
                    provider_id: user.provider_id().to_string(),
                }
            } else {
                store_error("create", e)
            }
        })?;

        Ok(())
    }
}
