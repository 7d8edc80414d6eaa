use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use super::schema::Database;
use super::types::FlagSet;

// ============================================================================
// Flag Store
// ============================================================================

/// Two durable sets of article URLs: read and favorite.
///
/// Keys are opaque strings. Every write is committed before the returned future
/// resolves; nothing is buffered. Writes to the same key are last-write-wins.
pub trait FlagStore: Send + Sync {
    fn contains(&self, set: FlagSet, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Insert `key`; a no-op if already present.
    fn add(&self, set: FlagSet, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete `key`; a no-op if absent.
    fn remove(&self, set: FlagSet, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Flip membership of `key` and return the new membership.
    fn toggle(&self, set: FlagSet, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Every key in `set`, most recently added first.
    fn members(&self, set: FlagSet) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl FlagStore for Database {
    async fn contains(&self, set: FlagSet, key: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM article_flags WHERE flag = ? AND url = ?")
                .bind(set.as_str())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn add(&self, set: FlagSet, key: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO article_flags (flag, url, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(flag, url) DO NOTHING
        "#,
        )
        .bind(set.as_str())
        .bind(key)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to add {} flag", set))?;
        Ok(())
    }

    async fn remove(&self, set: FlagSet, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM article_flags WHERE flag = ? AND url = ?")
            .bind(set.as_str())
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove {} flag", set))?;
        Ok(())
    }

    /// Delete-then-insert inside one transaction so concurrent toggles of the
    /// same key can't both observe "absent".
    async fn toggle(&self, set: FlagSet, key: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM article_flags WHERE flag = ? AND url = ?")
            .bind(set.as_str())
            .bind(key)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let now_member = if deleted == 0 {
            sqlx::query("INSERT INTO article_flags (flag, url, created_at) VALUES (?, ?, ?)")
                .bind(set.as_str())
                .bind(key)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;
            true
        } else {
            false
        };

        tx.commit()
            .await
            .with_context(|| format!("Failed to toggle {} flag", set))?;

        tracing::debug!(flag = %set, member = now_member, "Flag toggled");
        Ok(now_member)
    }

    async fn members(&self, set: FlagSet) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT url FROM article_flags WHERE flag = ? ORDER BY created_at DESC, url",
        )
        .bind(set.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local [`FlagStore`]; nothing survives the process.
///
/// Used by `--ephemeral` sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    // key -> insertion sequence, per set
    sets: Mutex<HashMap<FlagSet, HashMap<String, u64>>>,
    seq: std::sync::atomic::AtomicU64,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_set<T>(&self, set: FlagSet, f: impl FnOnce(&mut HashMap<String, u64>) -> T) -> T {
        // A panic while holding the lock can't leave a half-written entry
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        f(sets.entry(set).or_default())
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

impl FlagStore for MemoryFlagStore {
    async fn contains(&self, set: FlagSet, key: &str) -> Result<bool> {
        Ok(self.with_set(set, |s| s.contains_key(key)))
    }

    async fn add(&self, set: FlagSet, key: &str) -> Result<()> {
        let seq = self.next_seq();
        self.with_set(set, |s| {
            s.entry(key.to_string()).or_insert(seq);
        });
        Ok(())
    }

    async fn remove(&self, set: FlagSet, key: &str) -> Result<()> {
        self.with_set(set, |s| s.remove(key));
        Ok(())
    }

    async fn toggle(&self, set: FlagSet, key: &str) -> Result<bool> {
        let seq = self.next_seq();
        Ok(self.with_set(set, |s| {
            if s.remove(key).is_some() {
                false
            } else {
                s.insert(key.to_string(), seq);
                true
            }
        }))
    }

    async fn members(&self, set: FlagSet) -> Result<Vec<String>> {
        let mut entries: Vec<(String, u64)> =
            self.with_set(set, |s| s.iter().map(|(k, v)| (k.clone(), *v)).collect());
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(entries.into_iter().map(|(k, _)| k).collect())
    }
}
