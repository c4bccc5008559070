/// Refresh token records
///
/// Only the SHA-256 digest of a refresh token is stored. `user_id` is unique,
/// so a user has at most one live refresh token: login upserts by user and
/// rotation replaces the digest and expiry of that single row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id),
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Stored refresh token
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,

    /// Owning user (unique)
    pub user_id: Uuid,

    /// Hex SHA-256 of the token string
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// Authoritative expiry; a token past this instant is dead even if its
    /// signature still verifies
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the stored expiry has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Whether `token` is the value this record was written for
    pub fn matches(&self, token: &str) -> bool {
        self.token_hash == hash_token(token)
    }

    /// Stores `token` as the user's only refresh token
    ///
    /// Single statement upsert on the `user_id` unique constraint, so two
    /// concurrent logins of one user leave exactly one row behind (the later
    /// writer wins).
    pub async fn upsert_for_user<'e, E>(
        executor: E,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING id, user_id, token_hash, expires_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Finds the refresh token of a user
    pub async fn find_by_user<'e, E>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at, updated_at
            FROM refresh_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    /// Finds the record for a presented token and row-locks it
    ///
    /// Must run inside a transaction; the lock is held until commit so a
    /// concurrent rotation of the same token waits and then finds nothing.
    pub async fn find_by_token_for_update<'e, E>(
        executor: E,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at, updated_at
            FROM refresh_tokens
            WHERE token_hash = $1
            FOR UPDATE
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    /// Replaces the token of an existing record
    ///
    /// Conditional on the previous digest, so a record that was rotated in
    /// between is left alone and `None` is returned.
    pub async fn replace_token<'e, E>(
        executor: E,
        id: Uuid,
        previous_token: &str,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            UPDATE refresh_tokens
            SET token_hash = $3,
                expires_at = $4,
                updated_at = NOW()
            WHERE id = $1 AND token_hash = $2
            RETURNING id, user_id, token_hash, expires_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(hash_token(previous_token))
        .bind(hash_token(new_token))
        .bind(expires_at)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    /// Deletes the record of `user_id` if it still holds `token`
    pub async fn delete_matching<'e, E>(
        executor: E,
        user_id: Uuid,
        token: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2")
                .bind(user_id)
                .bind(hash_token(token))
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes whatever refresh token the user holds
    pub async fn delete_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Hex SHA-256 digest used as the stored form of a refresh token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
