//! Binary blobs for file-backed content
//!
//! Uploaded files live next to the content records as
//! `contents/<uuid>.<ext>`. A blob is owned by whichever content records
//! reference its path; nothing deletes a blob when a record goes away. The
//! contents sweep ([`Repository::sweep_blobs`](crate::Repository::sweep_blobs))
//! collects blobs no record references.

use crate::io::{FileStore, LogicalPath, StoreError, StoreResult, compute_hash};
use crate::schema::{Family, MediaFile};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Longest extension kept from an uploaded file name
const MAX_EXTENSION_LEN: usize = 16;

/// Blob storage inside the contents directory
#[derive(Debug, Clone)]
pub struct BlobArena {
    store: Arc<FileStore>,
}

impl BlobArena {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }

    /// Store `bytes` under a fresh blob name
    ///
    /// The extension of `original_name` is kept (lowercased) so the blob's
    /// type stays recognizable on disk.
    pub async fn put(&self, original_name: &str, bytes: &[u8]) -> StoreResult<MediaFile> {
        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let path = Family::Contents.dir_path().join(&file_name)?;
        self.store.write_binary(&path, bytes).await?;

        let media = MediaFile {
            path: path.to_string(),
            original_name: original_name.to_string(),
            size: bytes.len() as u64,
            checksum: compute_hash(bytes),
        };
        info!(path = %media.path, size = media.size, "Stored blob");
        Ok(media)
    }

    /// Read a blob back. Absence is [`StoreError::NotFound`].
    pub async fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let path = parse_blob_path(path)?;
        self.store.read_binary(&path).await
    }

    /// Whether the stored bytes still match the recorded size and checksum
    pub async fn verify(&self, media: &MediaFile) -> StoreResult<bool> {
        let bytes = self.get(&media.path).await?;
        let intact = bytes.len() as u64 == media.size && compute_hash(&bytes) == media.checksum;
        if !intact {
            warn!(path = %media.path, "Blob does not match its recorded checksum");
        }
        Ok(intact)
    }

    /// Delete a blob. Returns `false` if it was already absent.
    pub(crate) async fn delete(&self, path: &str) -> StoreResult<bool> {
        self.store.delete_file(&parse_blob_path(path)?).await
    }
}

/// Whether a file name in the contents directory is a blob
///
/// Blob names start with a UUID, which neither `index.json` nor
/// `content-<id>.json` can.
pub fn is_blob_name(file_name: &str) -> bool {
    let stem = file_name.split_once('.').map_or(file_name, |(stem, _)| stem);
    Uuid::parse_str(stem).is_ok() && stem.len() == 36
}

/// Parse a blob path and check it lives directly in the contents directory
pub(crate) fn parse_blob_path(raw: &str) -> StoreResult<LogicalPath> {
    let path = LogicalPath::parse(raw)?;
    let in_contents = path.parent() == Some(Family::Contents.dir_path());
    match path.file_name() {
        Some(name) if in_contents && is_blob_name(name) => Ok(path),
        _ => Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: "not a blob in the contents directory".to_string(),
        }),
    }
}

fn extension_of(original_name: &str) -> Option<String> {
    let (_, ext) = original_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let usable = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    usable.then_some(ext)
}
