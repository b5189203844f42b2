use crate::analysis::{Analysis, AnalysisId};
use crate::storage::AnalysisStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Analyses persisted as JSON snapshots keyed by an autoincrement row id
pub struct SqliteAnalysisStore {
    pool: Arc<SqlitePool>,
}

impl SqliteAnalysisStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn save(&self, analysis: Analysis) -> Result<Arc<Analysis>> {
        let payload =
            serde_json::to_string(&analysis).context("Failed to serialize analysis")?;

        let id = match analysis.id() {
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO analyses (id, created_at, payload)
                    VALUES (?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        created_at = excluded.created_at,
                        payload = excluded.payload
                    "#,
                )
                .bind(id as i64)
                .bind(analysis.created_at())
                .bind(&payload)
                .execute(self.pool.as_ref())
                .await?;
                id
            }
            None => {
                let result =
                    sqlx::query("INSERT INTO analyses (created_at, payload) VALUES (?, ?)")
                        .bind(analysis.created_at())
                        .bind(&payload)
                        .execute(self.pool.as_ref())
                        .await?;
                result.last_insert_rowid() as AnalysisId
            }
        };

        Ok(Arc::new(analysis.with_id(id)))
    }

    async fn find_by_id(&self, id: AnalysisId) -> Result<Option<Arc<Analysis>>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM analyses WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some((payload,)) => {
                let analysis: Analysis = serde_json::from_str(&payload)
                    .with_context(|| format!("Corrupt payload for analysis {}", id))?;
                Ok(Some(Arc::new(analysis.with_id(id))))
            }
            None => Ok(None),
        }
    }
}
