//! Path-addressable storage primitives
//!
//! This module provides the raw read/write layer under the store root:
//!
//! - **Logical paths**: slash-delimited, validated, case-sensitive
//! - **JSON payloads**: absent files read as `None`, not as errors
//! - **Binary payloads**: absence is `StoreError::NotFound`
//! - **Crash-safe writes**: temp file, `sync_all`, rename over the target
//! - **Usage reporting**: recursive listing classified into files and directories
//!
//! # Example
//!
//! ```rust,no_run
//! use signage_store_core::io::{FileStore, LogicalPath};
//!
//! # async fn example() -> Result<(), signage_store_core::io::StoreError> {
//! let store = FileStore::new("/var/lib/signage");
//! let index = LogicalPath::parse("/layouts/index.json")?;
//! let rows: Option<Vec<serde_json::Value>> = store.read_json(&index).await?;
//! println!("{} layouts", rows.map(|r| r.len()).unwrap_or(0));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hash;
pub mod path;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use hash::compute_hash;
pub use path::LogicalPath;
pub use store::{DirectoryUsage, EntryKind, FileStore, StorageEntry, StorageUsage};
