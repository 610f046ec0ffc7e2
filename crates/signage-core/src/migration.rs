//! One-shot content schema migration
//!
//! Schema version 1 used the content type `website`; the current schema calls
//! it `url`. [`MigrationRunner`] finds index rows still carrying the old
//! marker and rewrites the affected detail files and the index.
//!
//! The runner takes the contents lock key for its whole run, the same key
//! every content repository operation uses, so CRUD never observes a
//! half-migrated family.

use crate::error::Result;
use crate::io::FileStore;
use crate::lock::LockManager;
use crate::repository::{Entity, decode, schema_error};
use crate::schema::{Content, Family, VersionedContent, VersionedContentSummary, is_valid_id};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub migrated_count: usize,
    pub errors: Vec<MigrationFailure>,
}

/// A record the migration could not upgrade; its index row is left as is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFailure {
    pub id: String,
    pub message: String,
}

/// Upgrades legacy content records in place
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    store: Arc<FileStore>,
    locks: Arc<LockManager>,
}

impl MigrationRunner {
    pub fn new(store: Arc<FileStore>, locks: Arc<LockManager>) -> Self {
        Self { store, locks }
    }

    /// Whether any content index row still uses a legacy schema. Read-only.
    pub async fn needs_migration(&self) -> Result<bool> {
        self.locks
            .with_lock(&Family::Contents.lock_key(), || async {
                let rows = self.read_rows().await?;
                Ok(rows.iter().any(VersionedContentSummary::is_legacy))
            })
            .await
    }

    /// Upgrade every legacy record
    ///
    /// Per-record failures are collected in the report and do not stop the
    /// run. The index is rewritten once at the end, and only when at least one
    /// record was upgraded. Running again afterwards is a no-op.
    pub async fn run_migration(&self) -> Result<MigrationReport> {
        self.locks
            .with_lock(&Family::Contents.lock_key(), || async {
                let mut rows = self.read_rows().await?;
                let mut report = MigrationReport::default();

                for row in rows.iter_mut().filter(|row| row.is_legacy()) {
                    let id = row.id().to_string();
                    match self.migrate_record(&id).await {
                        Ok(content) => {
                            *row = VersionedContentSummary::Current(content.summarize());
                            report.migrated_count += 1;
                            debug!(id = %id, "Migrated content record");
                        }
                        Err(message) => {
                            warn!(id = %id, error = %message, "Content migration failed");
                            report.errors.push(MigrationFailure { id, message });
                        }
                    }
                }

                if report.migrated_count > 0 {
                    let index_path = Family::Contents.index_path()?;
                    self.store.write_json(&index_path, &rows).await?;
                }

                info!(
                    migrated = report.migrated_count,
                    failed = report.errors.len(),
                    "Content migration finished"
                );
                Ok(report)
            })
            .await
    }

    async fn read_rows(&self) -> Result<Vec<VersionedContentSummary>> {
        let path = Family::Contents.index_path()?;
        match self.store.read_json::<Value>(&path).await? {
            Some(value) => decode(Family::Contents, &path, value),
            None => Ok(Vec::new()),
        }
    }

    /// Load, upgrade, validate and rewrite one detail file. Caller holds the lock.
    async fn migrate_record(&self, id: &str) -> std::result::Result<Content, String> {
        if !is_valid_id(id) {
            return Err(format!("id '{id}' is not usable as a file name"));
        }
        let path = Family::Contents.detail_path(id).map_err(|e| e.to_string())?;

        let value = self
            .store
            .read_json::<Value>(&path)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "detail file is missing".to_string())?;
        let stored: VersionedContent =
            decode(Family::Contents, &path, value).map_err(|e| e.to_string())?;

        let content = stored.upgrade();
        if content.id != id {
            return Err(format!("detail file belongs to '{}'", content.id));
        }
        content
            .validate()
            .map_err(|message| schema_error(Family::Contents, &path, message).to_string())?;

        self.store
            .write_json(&path, &content)
            .await
            .map_err(|e| e.to_string())?;
        Ok(content)
    }
}
