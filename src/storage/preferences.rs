use anyhow::Result;

use super::schema::Database;

/// Preference key holding the last selected category tag.
pub const SESSION_CATEGORY_KEY: &str = "session.category";

impl Database {
    // ========================================================================
    // User Preferences Operations
    // ========================================================================

    /// Get a single preference value by key.
    ///
    /// Keys use dotted convention, e.g. `session.category`.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a preference value (UPSERT).
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete every stored flag and preference.
    ///
    /// Backs `--reset-db`. Runs in one transaction so a failure leaves the
    /// database untouched.
    pub async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM article_flags")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_preferences")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
