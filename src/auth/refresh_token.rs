/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 random bytes from the OS CSPRNG, hex-encoded (64 characters)
/// - Stored as their SHA-256 digest, never in plaintext
/// - Invalidated by revocation; the row is kept afterwards
/// - Only time-limited when `jwt.refresh_token_expiry` is configured

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Stored refresh token row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Owner of the token if it can still be exchanged for a session token
    pub fn usable_by(&self, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        if self.is_revoked() {
            return Err(AuthError::RefreshTokenRevoked);
        }
        if self.is_expired(now) {
            return Err(AuthError::RefreshTokenExpired);
        }
        Ok(self.user_id)
    }
}

/// Generate a new refresh token
///
/// The plaintext is returned to the client; the server keeps only its digest.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Save a refresh token for `user_id`
///
/// # Errors
/// Returns error if database operation fails
pub async fn save_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    expiry_seconds: Option<i64>,
) -> Result<(), AppError> {
    let now = Utc::now();
    let expires_at = expiry_seconds.map(|secs| now + Duration::seconds(secs));

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (token_hash, created_at, updated_at, user_id, expires_at, revoked_at)
        VALUES ($1, $2, $3, $4, $5, NULL)
        "#,
    )
    .bind(hash_token(token))
    .bind(now)
    .bind(now)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch the stored row for a refresh token
///
/// # Errors
/// `AuthError::RefreshTokenInvalid` if no such token was ever issued
pub async fn lookup_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<RefreshTokenRecord, AppError> {
    sqlx::query_as::<_, RefreshTokenRecord>(
        r#"
        SELECT token_hash, user_id, created_at, updated_at, expires_at, revoked_at
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!("Refresh token not found in database");
        AppError::Auth(AuthError::RefreshTokenInvalid)
    })
}

/// Validate a refresh token and return the user it belongs to
///
/// # Errors
/// Returns error if the token is unknown, revoked, or past a configured expiry
pub async fn validate_refresh_token(pool: &PgPool, token: &str) -> Result<Uuid, AppError> {
    let record = lookup_refresh_token(pool, token).await?;

    record.usable_by(Utc::now()).map_err(|e| {
        tracing::warn!(user_id = %record.user_id, reason = %e, "Rejected refresh token");
        AppError::Auth(e)
    })
}

/// Mark a refresh token revoked
///
/// Unknown tokens are ignored.
///
/// # Errors
/// Returns error if database operation fails
pub async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<(), AppError> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = $1, updated_at = $1
        WHERE token_hash = $2 AND revoked_at IS NULL
        "#,
    )
    .bind(now)
    .bind(hash_token(token))
    .execute(pool)
    .await?;

    tracing::debug!(rows = result.rows_affected(), "Refresh token revocation applied");
    Ok(())
}
