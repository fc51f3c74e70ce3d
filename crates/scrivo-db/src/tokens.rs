//! Bearer token repository implementation.
//!
//! Tokens are `sn_at_` followed by 48 random alphanumerics. Only the SHA-256
//! hex digest is stored; the plaintext is returned once, at issue time.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};
use tracing::info;

use scrivo_core::{Error, IssuedToken, Result, TokenRepository, UserId};

/// Prefix of every access token.
pub const TOKEN_PREFIX: &str = "sn_at_";

/// Random characters after the prefix.
pub const TOKEN_SECRET_LEN: usize = 48;

/// Generate a new random access token.
pub fn generate_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let secret: String = (0..TOKEN_SECRET_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!("{}{}", TOKEN_PREFIX, secret)
}

/// Hash a token using SHA256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Expiry instant for a token issued at `now`.
///
/// A lifetime past the representable date range is a configuration error.
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| Error::Config(format!("Token lifetime out of range: {}", ttl)))
}

/// Cheap shape check before touching the store.
pub fn looks_like_token(token: &str) -> bool {
    token
        .strip_prefix(TOKEN_PREFIX)
        .is_some_and(|s| s.len() == TOKEN_SECRET_LEN && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// PostgreSQL implementation of TokenRepository.
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: Pool<Postgres>,
}

impl PgTokenRepository {
    /// Create a new PgTokenRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn issue(&self, user: UserId, ttl: Duration) -> Result<IssuedToken> {
        let now = Utc::now();
        let token = generate_token();
        let expires_at = expiry_after(now, ttl)?;

        sqlx::query(
            r#"INSERT INTO auth_token (user_id, token_hash, expires_at, created_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(user)
        .bind(hash_token(&token))
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(IssuedToken {
            token,
            user_id: user,
            expires_at,
        })
    }

    async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        if !looks_like_token(token) {
            return Ok(None);
        }
        let now = Utc::now();
        let user: Option<i64> = sqlx::query_scalar(
            r#"UPDATE auth_token SET last_used_at = $2
               WHERE token_hash = $1 AND expires_at > $2
               RETURNING user_id"#,
        )
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_token WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(
                subsystem = "db",
                component = "tokens",
                op = "purge_expired",
                result_count = purged,
                "Purged expired tokens"
            );
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + TOKEN_SECRET_LEN);
        assert!(looks_like_token(&token));
    }

    #[test]
    fn test_generate_token_is_random() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = hash_token("sn_at_abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("sn_at_abc"));
        assert_ne!(hash, hash_token("sn_at_abd"));
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_expiry_after() {
        let now = Utc::now();
        assert_eq!(
            expiry_after(now, Duration::minutes(60)).unwrap(),
            now + Duration::minutes(60)
        );
        assert!(matches!(
            expiry_after(now, Duration::weeks(1_000_000_000)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_looks_like_token_rejects_garbage() {
        assert!(!looks_like_token(""));
        assert!(!looks_like_token("Bearer sn_at_x"));
        assert!(!looks_like_token(&format!("sn_at_{}", "a".repeat(47))));
        assert!(!looks_like_token(&format!("sn_at_{}!", "a".repeat(47))));
        assert!(looks_like_token(&format!("sn_at_{}", "a".repeat(48))));
    }
}
