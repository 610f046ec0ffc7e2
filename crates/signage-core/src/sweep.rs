//! Maintenance sweeps for files no index row references
//!
//! The write protocol can leave two kinds of leftovers behind:
//!
//! - orphan detail files, when a process dies between the detail write and
//!   the index write of a create, or between the two steps of a remove
//! - unreferenced blobs, because deleting a content record never deletes
//!   its uploaded file
//!
//! Both are harmless to readers. The sweeps here find and delete them under
//! the family lock, so they never race ordinary CRUD.

use crate::blob::{BlobArena, is_blob_name, parse_blob_path};
use crate::error::{RepositoryError, Result};
use crate::repository::{Entity, IndexRow, Repository};
use crate::schema::{Content, ContentDraft, ContentSummary, Family};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Outcome of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Nothing was deleted; `removed` lists what would have been
    pub dry_run: bool,
    /// Logical paths deleted (or selected, in a dry run)
    pub removed: Vec<String>,
    pub errors: Vec<SweepFailure>,
}

impl SweepReport {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: SweepReport) {
        self.removed.extend(other.removed);
        self.errors.extend(other.errors);
    }
}

/// A file or record the sweep could not handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub path: String,
    pub message: String,
}

impl<E: Entity> Repository<E> {
    /// Delete detail files whose id has no index row
    pub async fn sweep_orphans(&self, dry_run: bool) -> Result<SweepReport> {
        let family = E::FAMILY;
        self.locks()
            .with_lock(&family.lock_key(), || async {
                let indexed: HashSet<String> = self
                    .read_index()
                    .await?
                    .iter()
                    .map(|row| row.id().to_string())
                    .collect();

                let mut report = SweepReport::new(dry_run);
                let dir = family.dir_path();
                for name in self.store().list_directory(&dir).await? {
                    let Some(id) = family.id_from_detail_name(&name) else {
                        continue;
                    };
                    if indexed.contains(id) {
                        continue;
                    }

                    let path = dir.join(&name)?;
                    if !dry_run {
                        if let Err(e) = self.store().delete_file(&path).await {
                            warn!(%family, path = %path, error = %e, "Failed to delete orphan detail");
                            report.errors.push(SweepFailure {
                                path: path.to_string(),
                                message: e.to_string(),
                            });
                            continue;
                        }
                        self.locks().forget(&path.to_string());
                    }
                    report.removed.push(path.to_string());
                }

                info!(%family, dry_run, removed = report.removed.len(), "Swept orphan details");
                Ok(report)
            })
            .await
    }
}

impl Repository<Content> {
    /// Store an uploaded file and the content record pointing at it
    ///
    /// Both writes happen under one acquisition of the contents lock, so a
    /// concurrent blob sweep cannot collect the file before the record
    /// exists. Any `file` already set on the draft is replaced.
    pub async fn create_with_upload(
        &self,
        mut draft: ContentDraft,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<ContentSummary> {
        let blobs = self.blobs();
        self.locks()
            .with_lock(&Family::Contents.lock_key(), move || async move {
                let media = blobs.put(original_name, bytes).await?;
                let blob_path = media.path.clone();
                draft.file = Some(media);

                match self.create_unlocked(draft).await {
                    Ok(summary) => Ok(summary),
                    Err(e) => {
                        if let Err(cleanup) = blobs.delete(&blob_path).await {
                            warn!(path = %blob_path, error = %cleanup, "Failed to remove blob of rejected upload");
                        }
                        Err(e)
                    }
                }
            })
            .await
    }

    /// How many indexed content records reference each blob path
    ///
    /// Paths are reported in canonical form (`/contents/<name>`).
    ///
    /// Fails on the first record that cannot be loaded.
    pub async fn blob_reference_counts(&self) -> Result<BTreeMap<String, usize>> {
        self.locks()
            .with_lock(&Family::Contents.lock_key(), || async {
                let (counts, failures) = self.collect_blob_references().await?;
                match failures.into_iter().next() {
                    Some((_, e)) => Err(e),
                    None => Ok(counts),
                }
            })
            .await
    }

    /// Delete blobs in the contents directory no indexed record references
    ///
    /// If any indexed record cannot be loaded its references are unknown, so
    /// nothing is deleted and the unreadable records are reported instead.
    pub async fn sweep_blobs(&self, dry_run: bool) -> Result<SweepReport> {
        let blobs = self.blobs();
        self.locks()
            .with_lock(&Family::Contents.lock_key(), || async {
                let mut report = SweepReport::new(dry_run);
                let (counts, failures) = self.collect_blob_references().await?;
                if !failures.is_empty() {
                    warn!(unreadable = failures.len(), "Skipping blob sweep, some content records are unreadable");
                    report.errors = failures
                        .into_iter()
                        .map(|(path, e)| SweepFailure {
                            path,
                            message: e.to_string(),
                        })
                        .collect();
                    return Ok(report);
                }

                let dir = Family::Contents.dir_path();
                for name in self.store().list_directory(&dir).await? {
                    if !is_blob_name(&name) {
                        continue;
                    }
                    let path = dir.join(&name)?.to_string();
                    if counts.contains_key(&path) {
                        continue;
                    }

                    if !dry_run && let Err(e) = blobs.delete(&path).await {
                        warn!(path = %path, error = %e, "Failed to delete unreferenced blob");
                        report.errors.push(SweepFailure {
                            path,
                            message: e.to_string(),
                        });
                        continue;
                    }
                    report.removed.push(path);
                }

                info!(dry_run, removed = report.removed.len(), "Swept unreferenced blobs");
                Ok(report)
            })
            .await
    }

    fn blobs(&self) -> BlobArena {
        BlobArena::new(self.shared_store())
    }

    /// Reference counts plus the detail paths that failed to load. Caller holds the lock.
    async fn collect_blob_references(
        &self,
    ) -> Result<(BTreeMap<String, usize>, Vec<(String, RepositoryError)>)> {
        let mut counts = BTreeMap::new();
        let mut failures = Vec::new();

        for row in self.read_index().await? {
            let path = Family::Contents.detail_path(&row.id)?;
            match self.read_detail(&path).await {
                Ok(Some(content)) => {
                    let Some(file) = content.file else {
                        continue;
                    };
                    // Keyed by canonical path so it matches directory listings
                    match parse_blob_path(&file.path) {
                        Ok(blob) => *counts.entry(blob.to_string()).or_insert(0) += 1,
                        Err(e) => failures.push((path.to_string(), e.into())),
                    }
                }
                Ok(None) => {
                    warn!(id = %row.id, "Indexed content has no detail file");
                }
                Err(e) => failures.push((path.to_string(), e)),
            }
        }
        Ok((counts, failures))
    }
}
