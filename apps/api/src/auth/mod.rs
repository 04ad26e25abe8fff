//! Authentication: user accounts, password hashing and server-side sessions.
//!
//! Sessions live in Redis as `session:<token>` → user id with a TTL. The token travels
//! in the HTTP-only `sessionid` cookie; nothing else about the user is client-side.

pub mod handlers;
pub mod middleware;

use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand::distr::Alphanumeric;
use rand::Rng;
use redis::AsyncCommands;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

pub const SESSION_COOKIE: &str = "sessionid";
const SESSION_TOKEN_LEN: usize = 64;
const SESSION_KEY_PREFIX: &str = "session:";

/// The authenticated caller, inserted into request extensions by `require_session`.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Passwords
// ────────────────────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("salt encoding failed: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for an unreadable stored hash alike.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Verified against when the username is unknown, so a miss costs the same Argon2 work
/// as a wrong password.
static DUMMY_PASSWORD_HASH: Lazy<String> =
    Lazy::new(|| hash_password("resumate-dummy-password").unwrap_or_default());

/// Login check. `None` means no such user; it still runs a full verification and then
/// fails.
pub fn verify_login(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            verify_password(password, &DUMMY_PASSWORD_HASH);
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SessionStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    /// Issues a fresh token bound to `user_id`.
    pub async fn create(&self, user_id: Uuid) -> Result<String, redis::RedisError> {
        let token = generate_session_token();
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(session_key(&token), user_id.to_string(), self.ttl_secs)
            .await?;
        Ok(token)
    }

    /// `None` for unknown, expired or malformed tokens.
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, redis::RedisError> {
        if !is_well_formed_token(token) {
            return Ok(None);
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(session_key(token)).await?;
        Ok(stored.and_then(|s| Uuid::parse_str(&s).ok()))
    }

    /// Returns whether a session was actually removed.
    pub async fn destroy(&self, token: &str) -> Result<bool, redis::RedisError> {
        if !is_well_formed_token(token) {
            return Ok(false);
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = conn.del(session_key(token)).await?;
        Ok(removed > 0)
    }
}

fn session_key(token: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{token}")
}

fn generate_session_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn is_well_formed_token(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
}

// ────────────────────────────────────────────────────────────────────────────
// User records
// ────────────────────────────────────────────────────────────────────────────

/// Inserts a user; `None` if the username is already taken.
pub async fn create_user(pool: &PgPool, username: &str, password_hash: &str) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?)
}

pub async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    Ok(
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("123456").unwrap();
        let b = hash_password("123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_verify_login_unknown_user_still_hashes() {
        assert!(DUMMY_PASSWORD_HASH.starts_with("$argon2"));
        assert!(!verify_login("resumate-dummy-password", None));
        assert!(!verify_login("anything", None));
    }

    #[test]
    fn test_verify_login_known_user() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_login("hunter22", Some(&hash)));
        assert!(!verify_login("hunter23", Some(&hash)));
    }

    #[test]
    fn test_session_tokens_are_well_formed_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert!(is_well_formed_token(&a));
        assert_eq!(a.len(), SESSION_TOKEN_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("short"));
        assert!(!is_well_formed_token(&"*".repeat(SESSION_TOKEN_LEN)));
    }

    #[test]
    fn test_session_key_prefix() {
        assert_eq!(session_key("abc"), "session:abc");
    }

    #[tokio::test]
    async fn test_resolve_malformed_token_skips_redis() {
        // Nothing listens on port 1; reaching Redis would fail the test.
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let store = SessionStore::new(client, 60);
        assert_eq!(store.resolve("nope").await.unwrap(), None);
        assert!(!store.destroy("nope").await.unwrap());
    }
}
