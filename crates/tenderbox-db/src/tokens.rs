//! Bearer token resolution backed by the `api_tokens` table.
//!
//! Only SHA-256 digests of issued tokens are stored.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tracing::warn;

use tenderbox_core::{Actor, ActorResolver, Result, Role};

/// PostgreSQL implementation of [`ActorResolver`].
#[derive(Clone)]
pub struct PgActorResolver {
    pool: PgPool,
}

/// Hex-encoded SHA-256 digest of a raw token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

impl PgActorResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a token for `actor`. The raw token is not persisted.
    pub async fn register(&self, token: &str, actor: &Actor) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO api_tokens (token_hash, uid, display_name, role)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (token_hash) DO UPDATE
               SET uid = EXCLUDED.uid, display_name = EXCLUDED.display_name,
                   role = EXCLUDED.role, revoked_at = NULL"#,
        )
        .bind(hash_token(token))
        .bind(&actor.uid)
        .bind(&actor.name)
        .bind(actor.role.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a token revoked. Returns false if it was unknown or already revoked.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE api_tokens SET revoked_at = now() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ActorResolver for PgActorResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Actor>> {
        let row = sqlx::query(
            r#"SELECT uid, display_name, role FROM api_tokens
               WHERE token_hash = $1 AND revoked_at IS NULL"#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let uid: String = row.try_get("uid")?;
        let role: String = row.try_get("role")?;
        match role.parse::<Role>() {
            Ok(role) => Ok(Some(Actor::new(uid, role, row.try_get::<String, _>("display_name")?))),
            Err(e) => {
                warn!(
                    subsystem = "db",
                    component = "tokens",
                    actor_uid = %uid,
                    error = %e,
                    "Token carries an unrecognised role"
                );
                Ok(None)
            }
        }
    }
}
