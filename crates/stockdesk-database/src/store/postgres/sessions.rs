//! Refresh sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockdesk_core::result::AppResult;
use stockdesk_core::types::{RefreshSessionId, UserId};
use stockdesk_entity::session::{NewRefreshSession, RefreshSession};

use super::{PgStore, db_error};
use crate::store::RefreshSessionStore;

const INSERT_SESSION: &str = "INSERT INTO refresh_sessions (id, user_id, token_hash, expires_at) \
     VALUES ($1, $2, $3, $4) RETURNING *";

#[async_trait]
impl RefreshSessionStore for PgStore {
    async fn create(&self, data: NewRefreshSession) -> AppResult<RefreshSession> {
        sqlx::query_as::<_, RefreshSession>(INSERT_SESSION)
            .bind(RefreshSessionId::new())
            .bind(data.user_id)
            .bind(&data.token_hash)
            .bind(data.expires_at)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to create refresh session"))
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>("SELECT * FROM refresh_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find refresh session"))
    }

    async fn rotate(
        &self,
        current_hash: &str,
        successor: NewRefreshSession,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshSession>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin rotation"))?;

        // The conditional update is the claim: of two concurrent rotations
        // only one sees the row unrevoked.
        let claimed = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = $2, replaced_by_hash = $3 \
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > $2",
        )
        .bind(current_hash)
        .bind(now)
        .bind(&successor.token_hash)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to revoke refresh session"))?
        .rows_affected();

        if claimed != 1 {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back rotation"))?;
            return Ok(None);
        }

        let next = sqlx::query_as::<_, RefreshSession>(INSERT_SESSION)
            .bind(RefreshSessionId::new())
            .bind(successor.user_id)
            .bind(&successor.token_hash)
            .bind(successor.expires_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to insert rotated session"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit rotation"))?;
        Ok(Some(next))
    }

    async fn revoke(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = $2 WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to revoke refresh session"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list refresh sessions"))
    }
}
