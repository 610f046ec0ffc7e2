//! Generic index/detail repository
//!
//! Every family is stored as a small summary list (`<family>/index.json`) plus
//! one detail file per entity (`<family>/<prefix>-<id>.json`). Writes follow a
//! two-phase protocol:
//!
//! 1. Write (or delete) the detail file.
//! 2. Rewrite the index.
//!
//! Create and update write the detail first and the index last; remove drops
//! the index row first and the detail file last. The index is the source of
//! truth for existence, so an interrupted write can leave at most an orphan
//! detail file, which is harmless and is collected by
//! [`Repository::sweep_orphans`].
//!
//! Every public operation runs under the family's lock key, so operations on
//! one family are serialized while different families never block each other.

use crate::config::ConflictPolicy;
use crate::error::{RepositoryError, Result};
use crate::io::{FileStore, LogicalPath};
use crate::lock::LockManager;
use crate::schema::{Family, is_valid_id};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A summary row stored in a family's `index.json`
pub trait IndexRow: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A detail record stored in its own file
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Row kept in the family index
    type Summary: IndexRow;
    /// Payload accepted by [`Repository::create`]
    type Draft: Send;
    /// Partial update accepted by [`Repository::update`]
    type Patch: Send;

    const FAMILY: Family;

    fn id(&self) -> &str;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Build a new record from a draft with a freshly generated id
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge a patch into this record and bump `updated_at`
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Derive the index row, recomputing denormalized counters
    fn summarize(&self) -> Self::Summary;

    /// Check invariants serde cannot express
    fn validate(&self) -> std::result::Result<(), String>;
}

/// CRUD over one entity family
pub struct Repository<E> {
    store: Arc<FileStore>,
    locks: Arc<LockManager>,
    conflicts: ConflictPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            conflicts: self.conflicts,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<FileStore>, locks: Arc<LockManager>, conflicts: ConflictPolicy) -> Self {
        Self {
            store,
            locks,
            conflicts,
            _entity: PhantomData,
        }
    }

    pub fn family(&self) -> Family {
        E::FAMILY
    }

    /// All index rows; empty when the family has never been written
    pub async fn list_index(&self) -> Result<Vec<E::Summary>> {
        self.locks
            .with_lock(&E::FAMILY.lock_key(), || self.read_index())
            .await
    }

    /// Load one detail record. Absence is `Ok(None)`.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        if !is_valid_id(id) {
            debug!(family = %E::FAMILY, id, "Ignoring lookup for malformed id");
            return Ok(None);
        }

        self.locks
            .with_lock(&E::FAMILY.lock_key(), || async {
                let path = E::FAMILY.detail_path(id)?;
                let record = self.read_detail(&path).await?;
                if record.is_some() {
                    self.locks.record_read_timestamp(&path.to_string());
                }
                Ok(record)
            })
            .await
    }

    /// Validate and persist a new entity, returning its index row
    pub async fn create(&self, draft: E::Draft) -> Result<E::Summary> {
        self.locks
            .with_lock(&E::FAMILY.lock_key(), move || self.create_unlocked(draft))
            .await
    }

    /// Merge `patch` into an existing entity
    ///
    /// Fails with [`RepositoryError::NotFound`] if the id is absent. When the
    /// stored record is newer than this session's last read of it, the
    /// configured [`ConflictPolicy`] decides whether to warn, reject, or
    /// carry on silently.
    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<E::Summary> {
        if !is_valid_id(id) {
            return Err(self.not_found(id));
        }

        self.locks
            .with_lock(&E::FAMILY.lock_key(), move || async move {
                let path = E::FAMILY.detail_path(id)?;
                let path_key = path.to_string();
                let Some(mut record) = self.read_detail(&path).await? else {
                    return Err(self.not_found(id));
                };

                if self
                    .locks
                    .check_for_conflicts(&path_key, Some(record.updated_at()))
                {
                    match self.conflicts {
                        ConflictPolicy::Reject => {
                            warn!(family = %E::FAMILY, id, "Rejecting update of stale record");
                            return Err(RepositoryError::Conflict {
                                family: E::FAMILY,
                                id: id.to_string(),
                            });
                        }
                        ConflictPolicy::Warn => {
                            warn!(family = %E::FAMILY, id, "Record changed since last read, overwriting");
                        }
                        ConflictPolicy::Ignore => {}
                    }
                }

                let mut rows = self.read_index().await?;

                record.apply_patch(patch, Utc::now());
                self.check(&record, &path)?;
                self.store.write_json(&path, &record).await?;
                self.locks.record_read_timestamp(&path_key);

                let summary = record.summarize();
                match rows.iter_mut().find(|row| row.id() == id) {
                    Some(row) => *row = summary.clone(),
                    None => {
                        warn!(family = %E::FAMILY, id, "Index row missing for existing detail, restoring");
                        rows.push(summary.clone());
                    }
                }
                self.write_index(&rows).await?;

                info!(family = %E::FAMILY, id, "Updated entry");
                Ok(summary)
            })
            .await
    }

    /// Remove an entity. Removing an absent id succeeds.
    pub async fn remove(&self, id: &str) -> Result<()> {
        if !is_valid_id(id) {
            return Ok(());
        }

        self.locks
            .with_lock(&E::FAMILY.lock_key(), || async {
                let mut rows = self.read_index().await?;
                let before = rows.len();
                rows.retain(|row| row.id() != id);
                if rows.len() != before {
                    self.write_index(&rows).await?;
                }

                let path = E::FAMILY.detail_path(id)?;
                let deleted = self.store.delete_file(&path).await?;
                self.locks.forget(&path.to_string());

                info!(
                    family = %E::FAMILY,
                    id,
                    index_row = rows.len() != before,
                    detail_file = deleted,
                    "Removed entry"
                );
                Ok(())
            })
            .await
    }

    pub(crate) fn store(&self) -> &FileStore {
        &self.store
    }

    pub(crate) fn shared_store(&self) -> Arc<FileStore> {
        Arc::clone(&self.store)
    }

    pub(crate) fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Create without taking the family lock. Caller must hold it.
    pub(crate) async fn create_unlocked(&self, draft: E::Draft) -> Result<E::Summary> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = E::from_draft(id.clone(), draft, Utc::now());
        let path = E::FAMILY.detail_path(&id)?;
        self.check(&record, &path)?;

        let mut rows = self.read_index().await?;

        self.store.write_json(&path, &record).await?;
        self.locks.record_read_timestamp(&path.to_string());

        let summary = record.summarize();
        rows.push(summary.clone());
        self.write_index(&rows).await?;

        info!(family = %E::FAMILY, id = %id, "Created entry");
        Ok(summary)
    }

    /// Read the index without taking the family lock. Caller must hold it.
    pub(crate) async fn read_index(&self) -> Result<Vec<E::Summary>> {
        let path = E::FAMILY.index_path()?;
        match self.store.read_json::<Value>(&path).await? {
            Some(value) => decode(E::FAMILY, &path, value),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) async fn write_index(&self, rows: &[E::Summary]) -> Result<()> {
        let path = E::FAMILY.index_path()?;
        self.store.write_json(&path, rows).await?;
        Ok(())
    }

    /// Read and validate one detail file without taking the family lock
    pub(crate) async fn read_detail(&self, path: &LogicalPath) -> Result<Option<E>> {
        let Some(value) = self.store.read_json::<Value>(path).await? else {
            return Ok(None);
        };
        let record: E = decode(E::FAMILY, path, value)?;
        self.check(&record, path)?;

        let expected = path
            .file_name()
            .and_then(|name| E::FAMILY.id_from_detail_name(name));
        if expected != Some(record.id()) {
            return Err(schema_error(
                E::FAMILY,
                path,
                format!("record id '{}' does not match its file name", record.id()),
            ));
        }
        Ok(Some(record))
    }

    fn check(&self, record: &E, path: &LogicalPath) -> Result<()> {
        record
            .validate()
            .map_err(|message| schema_error(E::FAMILY, path, message))
    }

    fn not_found(&self, id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            family: E::FAMILY,
            id: id.to_string(),
        }
    }
}

/// Decode a raw JSON value into a typed schema
pub(crate) fn decode<T: DeserializeOwned>(
    family: Family,
    path: &LogicalPath,
    value: Value,
) -> Result<T> {
    serde_json::from_value(value).map_err(|e| schema_error(family, path, e.to_string()))
}

pub(crate) fn schema_error(family: Family, path: &LogicalPath, message: String) -> RepositoryError {
    RepositoryError::Schema {
        family,
        path: path.to_string(),
        message,
    }
}
