//! The per-process entry point
//!
//! A [`Session`] owns one [`FileStore`] and one [`LockManager`] and hands
//! shared handles to every repository it builds. Two sessions over the same
//! root do not coordinate with each other; open one per process.

use crate::blob::BlobArena;
use crate::config::{Config, ConflictPolicy};
use crate::error::Result;
use crate::io::{FileStore, StorageUsage};
use crate::lock::LockManager;
use crate::migration::MigrationRunner;
use crate::repository::Repository;
use crate::schema::{Content, Layout, Playlist, Schedule};
use crate::sweep::SweepReport;
use crate::usage::UsageResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Repositories and services over one store root
pub struct Session {
    root: PathBuf,
    store: Arc<FileStore>,
    locks: Arc<LockManager>,
    contents: Repository<Content>,
    layouts: Repository<Layout>,
    playlists: Repository<Playlist>,
    schedules: Repository<Schedule>,
}

impl Session {
    /// Build a session without touching the disk
    pub fn new(root: impl Into<PathBuf>, conflicts: ConflictPolicy) -> Self {
        let root = root.into();
        let store = Arc::new(FileStore::new(root.clone()));
        let locks = Arc::new(LockManager::new());

        Self {
            contents: Repository::new(Arc::clone(&store), Arc::clone(&locks), conflicts),
            layouts: Repository::new(Arc::clone(&store), Arc::clone(&locks), conflicts),
            playlists: Repository::new(Arc::clone(&store), Arc::clone(&locks), conflicts),
            schedules: Repository::new(Arc::clone(&store), Arc::clone(&locks), conflicts),
            root,
            store,
            locks,
        }
    }

    /// Build a session from resolved configuration
    ///
    /// Pending content migrations run here when `migrations.auto_run` is set.
    /// Per-record migration failures are logged, not returned.
    pub async fn open(config: &Config, home_dir: &Path) -> Result<Self> {
        let session = Self::new(config.store_root(home_dir), config.conflicts.policy);
        info!(root = %session.root.display(), policy = %config.conflicts.policy, "Opened store");

        if config.migrations.auto_run {
            let migrations = session.migrations();
            if migrations.needs_migration().await? {
                let report = migrations.run_migration().await?;
                for failure in &report.errors {
                    warn!(id = %failure.id, error = %failure.message, "Content record left on legacy schema");
                }
                info!(migrated = report.migrated_count, "Applied pending migrations");
            }
        }

        Ok(session)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contents(&self) -> &Repository<Content> {
        &self.contents
    }

    pub fn layouts(&self) -> &Repository<Layout> {
        &self.layouts
    }

    pub fn playlists(&self) -> &Repository<Playlist> {
        &self.playlists
    }

    pub fn schedules(&self) -> &Repository<Schedule> {
        &self.schedules
    }

    pub fn blobs(&self) -> BlobArena {
        BlobArena::new(Arc::clone(&self.store))
    }

    pub fn usage_resolver(&self) -> UsageResolver {
        UsageResolver::new(self.playlists.clone(), self.schedules.clone())
    }

    pub fn migrations(&self) -> MigrationRunner {
        MigrationRunner::new(Arc::clone(&self.store), Arc::clone(&self.locks))
    }

    /// Raw file and byte counts for the whole store
    pub async fn storage_usage(&self) -> Result<StorageUsage> {
        Ok(self.store.storage_usage().await?)
    }

    /// Sweep orphan detail files in every family, then unreferenced blobs
    pub async fn sweep(&self, dry_run: bool) -> Result<SweepReport> {
        let mut report = self.contents.sweep_orphans(dry_run).await?;
        report.merge(self.layouts.sweep_orphans(dry_run).await?);
        report.merge(self.playlists.sweep_orphans(dry_run).await?);
        report.merge(self.schedules.sweep_orphans(dry_run).await?);
        report.merge(self.contents.sweep_blobs(dry_run).await?);
        Ok(report)
    }
}
