//! SQLite document store for synced records
//!
//! Each collection is a table of JSON documents keyed by the remote id.
//! Inserts are append-only: syncing the same window twice stores the records
//! twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use qdmsync_core::RecordRepository;
use qdmsync_domain::{
    Customer, CustomerGroup, Order, PersistenceConfig, QdmSyncError, Result as DomainResult,
};
use rusqlite::params;
use serde::Serialize;
use serde_json::Value;
use tokio::task;
use tracing::{debug, info};

use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

/// Tables of the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Orders,
    Customers,
    CustomerGroups,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::CustomerGroups => "customer_groups",
        }
    }
}

/// SQLite-backed [`RecordRepository`].
pub struct SqliteDocumentRepository {
    db: Arc<DbManager>,
    closed: AtomicBool,
}

impl SqliteDocumentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, closed: AtomicBool::new(false) }
    }

    /// Open the configured database and make sure its schema exists.
    pub fn open(config: &PersistenceConfig) -> DomainResult<Self> {
        let db = DbManager::new(&config.path, config.pool_size)?;
        db.health_check()?;
        db.run_migrations()?;
        info!(path = %config.path, "document store ready");
        Ok(Self::new(Arc::new(db)))
    }

    /// Number of documents stored in `collection`.
    pub async fn count(&self, collection: Collection) -> DomainResult<i64> {
        let db = self.connected()?;
        task::spawn_blocking(move || -> DomainResult<i64> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
            Ok(conn.query_row(&sql, [], |row| row.get::<_, i64>(0)).map_err(InfraError::from)?)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Stored documents of `collection` in insertion order.
    pub async fn documents(&self, collection: Collection) -> DomainResult<Vec<Value>> {
        let db = self.connected()?;
        task::spawn_blocking(move || -> DomainResult<Vec<Value>> {
            let conn = db.get_connection()?;
            query_documents(&conn, collection)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert<R>(
        &self,
        collection: Collection,
        records: &[R],
        key: fn(&R) -> i64,
    ) -> DomainResult<()>
    where
        R: Serialize,
    {
        if records.is_empty() {
            return Ok(());
        }
        let db = self.connected()?;

        let documents = records
            .iter()
            .map(|record| -> DomainResult<(i64, String)> {
                let document = serde_json::to_string(record).map_err(InfraError::from)?;
                Ok((key(record), document))
            })
            .collect::<DomainResult<Vec<_>>>()?;
        let count = documents.len();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            insert_documents(&mut conn, collection, &documents)
        })
        .await
        .map_err(map_join_error)??;

        debug!(collection = collection.table(), count, "documents inserted");
        Ok(())
    }

    fn connected(&self) -> DomainResult<Arc<DbManager>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QdmSyncError::Persistence("repository is disconnected".into()));
        }
        Ok(Arc::clone(&self.db))
    }
}

#[async_trait]
impl RecordRepository for SqliteDocumentRepository {
    async fn store(&self, orders: &[Order]) -> DomainResult<()> {
        self.insert(Collection::Orders, orders, |order| order.order_id).await
    }

    async fn store_customers(&self, customers: &[Customer]) -> DomainResult<()> {
        self.insert(Collection::Customers, customers, |customer| customer.customer_id).await
    }

    async fn store_customer_groups(&self, groups: &[CustomerGroup]) -> DomainResult<()> {
        self.insert(Collection::CustomerGroups, groups, |group| group.customer_group_id).await
    }

    async fn disconnect(&self) -> DomainResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(path = %self.db.path().display(), "document store disconnected");
        }
        Ok(())
    }
}

fn insert_documents(
    conn: &mut SqliteConnection,
    collection: Collection,
    documents: &[(i64, String)],
) -> DomainResult<()> {
    let inserted_at = Utc::now().timestamp();
    let tx = conn.transaction().map_err(InfraError::from)?;
    {
        let sql = format!(
            "INSERT INTO {} (record_key, document, inserted_at) VALUES (?1, ?2, ?3)",
            collection.table()
        );
        let mut stmt = tx.prepare(&sql).map_err(InfraError::from)?;
        for (key, document) in documents {
            stmt.execute(params![key, document, inserted_at]).map_err(InfraError::from)?;
        }
    }
    // Dropping an uncommitted transaction rolls it back.
    tx.commit().map_err(InfraError::from)?;
    Ok(())
}

fn query_documents(conn: &SqliteConnection, collection: Collection) -> DomainResult<Vec<Value>> {
    let sql = format!("SELECT document FROM {} ORDER BY id", collection.table());
    let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
    let raw = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(InfraError::from)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(InfraError::from)?;

    raw.iter()
        .map(|document| {
            serde_json::from_str(document).map_err(|e| {
                QdmSyncError::Persistence(format!("stored document is not valid JSON: {e}"))
            })
        })
        .collect()
}

fn map_join_error(err: task::JoinError) -> QdmSyncError {
    if err.is_cancelled() {
        QdmSyncError::Internal("blocking database task cancelled".into())
    } else {
        QdmSyncError::Internal(format!("blocking database task failed: {err}"))
    }
}
