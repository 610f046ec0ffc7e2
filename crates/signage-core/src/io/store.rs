//! Path-addressable file store
//!
//! All payloads live below a single root directory. Writes go to a temp file
//! in the target directory, are flushed with `sync_all`, and then renamed over
//! the target, so readers never observe a half-written file.

use crate::io::error::{StoreError, StoreResult};
use crate::io::path::LogicalPath;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const TEMP_SUFFIX: &str = ".tmp";

/// Kind of an entry found while walking the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry from a recursive listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageEntry {
    /// Logical path of the entry
    pub path: LogicalPath,
    pub kind: EntryKind,
    /// Size in bytes (0 for directories)
    pub size: u64,
}

/// File and byte counts for one top-level directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryUsage {
    pub files: usize,
    pub bytes: u64,
}

/// Raw usage statistics for the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub files: usize,
    pub directories: usize,
    pub total_bytes: u64,
    /// Breakdown keyed by top-level directory name
    pub by_directory: BTreeMap<String, DirectoryUsage>,
}

/// Path-addressable store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and parse a JSON file
    ///
    /// Returns `Ok(None)` when the file (or one of its parents) does not exist.
    pub async fn read_json<T: DeserializeOwned>(&self, path: &LogicalPath) -> StoreResult<Option<T>> {
        let Some(bytes) = self.read_optional(path).await? else {
            debug!(path = %path, "JSON file absent");
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Json {
            path: path.to_string(),
            source: e,
        })?;
        Ok(Some(value))
    }

    /// Serialize `value` as 2-space indented JSON and replace the file
    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &LogicalPath,
        value: &T,
    ) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Json {
            path: path.to_string(),
            source: e,
        })?;
        self.write_atomic(path, &bytes).await
    }

    /// Read a binary file. Absence is an error here.
    pub async fn read_binary(&self, path: &LogicalPath) -> StoreResult<Vec<u8>> {
        self.read_optional(path)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    /// Replace a binary file, creating parent directories as needed
    pub async fn write_binary(&self, path: &LogicalPath, bytes: &[u8]) -> StoreResult<()> {
        self.write_atomic(path, bytes).await
    }

    /// Delete a file. Returns `false` if it was already absent.
    pub async fn delete_file(&self, path: &LogicalPath) -> StoreResult<bool> {
        match fs::remove_file(path.to_fs_path(&self.root)).await {
            Ok(()) => {
                debug!(path = %path, "Deleted file");
                Ok(true)
            }
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    pub async fn exists(&self, path: &LogicalPath) -> StoreResult<bool> {
        match fs::try_exists(path.to_fs_path(&self.root)).await {
            Ok(found) => Ok(found),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Sorted entry names directly below `path`
    ///
    /// A missing directory lists as empty. In-flight temp files are hidden.
    pub async fn list_directory(&self, path: &LogicalPath) -> StoreResult<Vec<String>> {
        let mut reader = match fs::read_dir(path.to_fs_path(&self.root)).await {
            Ok(reader) => reader,
            Err(e) if is_absent(&e) => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| StoreError::io(path, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_temp_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every file and directory below `path`, classified
    pub async fn list_recursive(&self, path: &LogicalPath) -> StoreResult<Vec<StorageEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![path.clone()];

        while let Some(dir) = pending.pop() {
            for name in self.list_directory(&dir).await? {
                let child = dir.join(&name)?;
                let metadata = match fs::symlink_metadata(child.to_fs_path(&self.root)).await {
                    Ok(metadata) => metadata,
                    // Removed between listing and stat
                    Err(e) if is_absent(&e) => continue,
                    Err(e) => return Err(StoreError::io(&child, e)),
                };

                if metadata.is_dir() {
                    pending.push(child.clone());
                    entries.push(StorageEntry {
                        path: child,
                        kind: EntryKind::Directory,
                        size: 0,
                    });
                } else {
                    entries.push(StorageEntry {
                        path: child,
                        kind: EntryKind::File,
                        size: metadata.len(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Walk the whole store and total up files and bytes
    pub async fn storage_usage(&self) -> StoreResult<StorageUsage> {
        let mut usage = StorageUsage::default();
        for entry in self.list_recursive(&LogicalPath::root()).await? {
            match entry.kind {
                EntryKind::Directory => usage.directories += 1,
                EntryKind::File => {
                    usage.files += 1;
                    usage.total_bytes += entry.size;
                    let top = top_level_name(&entry.path);
                    let bucket = usage.by_directory.entry(top).or_default();
                    bucket.files += 1;
                    bucket.bytes += entry.size;
                }
            }
        }
        Ok(usage)
    }

    async fn read_optional(&self, path: &LogicalPath) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path.to_fs_path(&self.root)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write_atomic(&self, path: &LogicalPath, bytes: &[u8]) -> StoreResult<()> {
        let Some(file_name) = path.file_name() else {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "cannot write to the store root".to_string(),
            });
        };

        let target = path.to_fs_path(&self.root);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(path, e))?;
        }

        let tmp_path = target.with_file_name(format!(
            ".{file_name}.{}{TEMP_SUFFIX}",
            uuid::Uuid::new_v4().simple()
        ));

        let written = async {
            let mut tmp_file = fs::File::create(&tmp_path).await?;
            tmp_file.write_all(bytes).await?;
            tmp_file.sync_all().await?;
            drop(tmp_file);
            fs::rename(&tmp_path, &target).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path).await; // Best-effort cleanup
            return Err(StoreError::io(path, e));
        }

        debug!(path = %path, bytes = bytes.len(), "Wrote file");
        Ok(())
    }
}

/// Whether `name` is an in-flight write (`.<target>.<32 hex>.tmp`)
fn is_temp_name(name: &str) -> bool {
    let Some(inner) = name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_SUFFIX))
    else {
        return false;
    };
    match inner.rsplit_once('.') {
        Some((target, nonce)) => {
            !target.is_empty() && nonce.len() == 32 && nonce.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Missing file, or a parent that is a regular file
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn top_level_name(path: &LogicalPath) -> String {
    let rendered = path.to_string();
    let trimmed = rendered.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((top, _)) => top.to_string(),
        None => String::from("."),
    }
}
