use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::keyword::{
    KeywordListFilter, KeywordPage, KeywordRecord, KeywordStats, TriState, UpsertKeyword,
    UpsertOutcome,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Keyword store connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn keyword_repo(&self) -> repositories::keyword::KeywordRepository {
        repositories::keyword::KeywordRepository::new(self.conn.clone())
    }

    pub async fn upsert_keyword(&self, input: &UpsertKeyword) -> Result<UpsertOutcome> {
        self.keyword_repo().upsert(input).await
    }

    pub async fn list_keywords(&self, filter: &KeywordListFilter) -> Result<KeywordPage> {
        self.keyword_repo().list(filter).await
    }

    pub async fn keyword_snapshot(&self, preview: u64) -> Result<(u64, Vec<KeywordRecord>)> {
        self.keyword_repo().list_all_snapshot(preview).await
    }

    pub async fn mark_keyword_used(&self, id: i32) -> Result<bool> {
        self.keyword_repo().mark_used(id).await
    }

    pub async fn mark_keywords_used_batch(
        &self,
        keywords: &[String],
        kind: Option<&str>,
    ) -> Result<u64> {
        self.keyword_repo().mark_used_batch(keywords, kind).await
    }

    pub async fn ignore_keyword(&self, id: i32) -> Result<bool> {
        self.keyword_repo().ignore(id).await
    }

    pub async fn list_keyword_types(&self) -> Result<Vec<String>> {
        self.keyword_repo().distinct_kinds().await
    }

    pub async fn keyword_stats(&self) -> Result<KeywordStats> {
        self.keyword_repo().stats().await
    }

    pub async fn keyword_count(&self) -> Result<u64> {
        self.keyword_repo().count().await
    }
}
