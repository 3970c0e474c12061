use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use crate::shared::database::store::Instance;

/// 인스턴스 레지스트리 Repository
/// Instance registry, read once at startup
pub struct InstanceRepository {
    pool: PgPool,
}

impl InstanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Instance>> {
        let rows = sqlx::query("SELECT instance_id FROM instances ORDER BY instance_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to read instances")?;

        Ok(rows
            .iter()
            .map(|row| Instance {
                instance_id: row.get("instance_id"),
            })
            .collect())
    }
}
