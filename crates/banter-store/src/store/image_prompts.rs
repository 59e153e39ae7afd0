//! Fallback prompt pool for image generation.

use super::Store;
use banter_core::error::BanterError;

impl Store {
    /// Pick one prompt uniformly at random from the pool.
    /// `None` when the pool is empty.
    pub async fn random_image_prompt(&self) -> Result<Option<String>, BanterError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT prompt FROM image_prompts ORDER BY RANDOM() LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| BanterError::Store(format!("query failed: {e}")))?;

        Ok(row.map(|(prompt,)| prompt))
    }

    /// Add a prompt to the pool.
    pub async fn add_image_prompt(&self, prompt: &str) -> Result<(), BanterError> {
        sqlx::query("INSERT INTO image_prompts (prompt) VALUES (?)")
            .bind(prompt)
            .execute(&self.pool)
            .await
            .map_err(|e| BanterError::Store(format!("insert failed: {e}")))?;

        Ok(())
    }
}
