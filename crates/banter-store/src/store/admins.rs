//! Admin whitelist lookup.

use super::Store;
use banter_core::error::BanterError;

impl Store {
    /// Whether a user id is in the admin whitelist.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool, BanterError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM admins WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BanterError::Store(format!("query failed: {e}")))?;

        Ok(row.is_some())
    }

    /// Add an admin. Idempotent on id.
    pub async fn add_admin(&self, user_id: i64, name: &str) -> Result<(), BanterError> {
        sqlx::query("INSERT OR IGNORE INTO admins (id, name) VALUES (?, ?)")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| BanterError::Store(format!("insert failed: {e}")))?;

        Ok(())
    }
}
