//! SQLite-based integration store

use crate::core::{Integration, Metadata};
use crate::persistence::IntegrationStore;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

/// SQLite integration store
pub struct SqliteIntegrationStore {
    pool: SqlitePool,
}

impl SqliteIntegrationStore {
    /// Create a new SQLite store
    ///
    /// `":memory:"` opens a private in-memory database on a single connection.
    pub async fn new(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .context("Invalid database path")?
            .create_if_missing(true);

        let max_connections = if db_path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS integrations (
                id TEXT PRIMARY KEY,
                provider TEXT NOT NULL,
                name TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                date_added TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS organization_integrations (
                organization_id INTEGER NOT NULL,
                integration_id TEXT NOT NULL REFERENCES integrations(id),
                PRIMARY KEY (organization_id, integration_id)
            );

            CREATE INDEX IF NOT EXISTS idx_integrations_name ON integrations(name);
            CREATE INDEX IF NOT EXISTS idx_org_integrations_org ON organization_integrations(organization_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    /// SQLite has no unsigned 64-bit integers
    fn organization_key(organization_id: u64) -> Result<i64> {
        i64::try_from(organization_id)
            .with_context(|| format!("Organization id {} is out of range", organization_id))
    }

    fn from_row(row: &SqliteRow) -> Result<Integration> {
        let metadata: Metadata = serde_json::from_str(&row.try_get::<String, _>("metadata")?)
            .context("Corrupt integration metadata")?;

        Ok(Integration {
            id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
            provider: row.try_get("provider")?,
            name: row.try_get("name")?,
            metadata,
            date_added: Self::from_naive(row.try_get("date_added")?),
        })
    }
}

#[async_trait::async_trait]
impl IntegrationStore for SqliteIntegrationStore {
    async fn create(
        &self,
        provider_id: &str,
        provider_name: &str,
        metadata: Metadata,
    ) -> Result<Integration> {
        let integration = Integration::new(provider_id, provider_name, metadata);

        sqlx::query(
            r#"
            INSERT INTO integrations (id, provider, name, metadata, date_added)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(integration.id.to_string())
        .bind(&integration.provider)
        .bind(&integration.name)
        .bind(serde_json::to_string(&integration.metadata)?)
        .bind(Self::to_naive(integration.date_added))
        .execute(&self.pool)
        .await
        .context("Failed to create integration")?;

        Ok(integration)
    }

    async fn create_for_organization(
        &self,
        provider_id: &str,
        provider_name: &str,
        organization_id: u64,
        metadata: Metadata,
    ) -> Result<Integration> {
        let organization_key = Self::organization_key(organization_id)?;
        let integration = Integration::new(provider_id, provider_name, metadata);

        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO integrations (id, provider, name, metadata, date_added)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(integration.id.to_string())
        .bind(&integration.provider)
        .bind(&integration.name)
        .bind(serde_json::to_string(&integration.metadata)?)
        .bind(Self::to_naive(integration.date_added))
        .execute(&mut *tx)
        .await
        .context("Failed to create integration")?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO organization_integrations (organization_id, integration_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(organization_key)
        .bind(integration.id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to attach integration")?;

        tx.commit().await.context("Failed to commit integration")?;

        Ok(integration)
    }

    async fn get(&self, id: Uuid, organization_id: u64) -> Result<Option<Integration>> {
        let row = sqlx::query(
            r#"
            SELECT i.id, i.provider, i.name, i.metadata, i.date_added
            FROM integrations i
            JOIN organization_integrations oi ON oi.integration_id = i.id
            WHERE i.id = ?1 AND oi.organization_id = ?2
            "#,
        )
        .bind(id.to_string())
        .bind(Self::organization_key(organization_id)?)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load integration")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn update(&self, id: Uuid, metadata: Metadata) -> Result<()> {
        let result = sqlx::query("UPDATE integrations SET metadata = ?1 WHERE id = ?2")
            .bind(serde_json::to_string(&metadata)?)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update integration")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Integration {} does not exist", id);
        }
        Ok(())
    }

    async fn attach_to_organization(
        &self,
        integration_id: Uuid,
        organization_id: u64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO organization_integrations (organization_id, integration_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(Self::organization_key(organization_id)?)
        .bind(integration_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to attach integration")?;

        Ok(())
    }

    async fn list_for_organization(
        &self,
        organization_id: u64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Integration>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.provider, i.name, i.metadata, i.date_added
            FROM integrations i
            JOIN organization_integrations oi ON oi.integration_id = i.id
            WHERE oi.organization_id = ?1
            ORDER BY i.name ASC, i.id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(Self::organization_key(organization_id)?)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list integrations")?;

        rows.iter().map(Self::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteIntegrationStore::new(":memory:").await.unwrap();

        let integration = store
            .create("example", "Example", Metadata::new())
            .await
            .unwrap();
        store.attach_to_organization(integration.id, 1).await.unwrap();

        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Example");
        assert_eq!(loaded.provider, "example");
        assert!(store.get(integration.id, 2).await.unwrap().is_none());

        let mut metadata = Metadata::new();
        metadata.insert("url".to_string(), json!("https://example.com"));
        store.update(integration.id, metadata).await.unwrap();

        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.get("url"), Some(&json!("https://example.com")));
    }

    #[tokio::test]
    async fn test_sqlite_list_ordering() {
        let store = SqliteIntegrationStore::new(":memory:").await.unwrap();

        for name in ["Zulip", "Asana"] {
            let mut metadata = Metadata::new();
            metadata.insert("name".to_string(), json!(name));
            let integration = store.create("example", "Example", metadata).await.unwrap();
            store.attach_to_organization(integration.id, 1).await.unwrap();
            store.attach_to_organization(integration.id, 1).await.unwrap();
        }

        let listed = store.list_for_organization(1, 0, 10).await.unwrap();
        let names: Vec<_> = listed.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Asana", "Zulip"]);
    }

    #[tokio::test]
    async fn test_sqlite_create_for_organization() {
        let store = SqliteIntegrationStore::new(":memory:").await.unwrap();
        let integration = store
            .create_for_organization("example", "Example", 1, Metadata::new())
            .await
            .unwrap();

        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.id, integration.id);
        assert_eq!(store.list_for_organization(1, 0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_organization_id_is_rejected() {
        let store = SqliteIntegrationStore::new(":memory:").await.unwrap();
        let too_large = i64::MAX as u64 + 1;

        assert!(store
            .create_for_organization("example", "Example", too_large, Metadata::new())
            .await
            .is_err());
        assert!(store.list_for_organization(too_large, 0, 10).await.is_err());
        assert!(store.get(Uuid::new_v4(), too_large).await.is_err());
        assert!(store.list_for_organization(1, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_integration_fails() {
        let store = SqliteIntegrationStore::new(":memory:").await.unwrap();
        assert!(store.update(Uuid::new_v4(), Metadata::new()).await.is_err());
    }
}
