//! Core library for signage-store
//!
//! A file-backed document store for digital-signage data. Four entity
//! families (contents, layouts, playlists, schedules) live under one root
//! directory, each as a summary `index.json` plus one detail file per entity.
//!
//! - [`io`]: the path-addressable store (logical paths, JSON and binary files)
//! - [`lock`]: keyed FIFO locks and read watermarks
//! - [`repository`]: generic index/detail CRUD with a two-phase write protocol
//! - [`migration`]: legacy content schema upgrades
//! - [`usage`]: cross-reference queries tolerant of unreadable records
//! - [`blob`] and [`sweep`]: uploaded media and garbage collection
//! - [`session`]: wires all of the above together over one root
//!
//! ```rust,no_run
//! use signage_store_core::config::ConflictPolicy;
//! use signage_store_core::schema::LayoutDraft;
//! use signage_store_core::{Session, UsageTarget};
//!
//! # async fn example() -> signage_store_core::Result<()> {
//! let session = Session::new("/var/lib/signage", ConflictPolicy::Warn);
//! let layout = session.layouts().create(LayoutDraft::new("Lobby")).await?;
//! let usage = session
//!     .usage_resolver()
//!     .compute_usage(&layout.id, UsageTarget::Layout)
//!     .await?;
//! assert!(!usage.is_used);
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod config;
pub mod error;
pub mod home;
pub mod io;
pub mod lock;
pub mod logging;
pub mod migration;
pub mod repository;
pub mod schema;
pub mod session;
pub mod sweep;
pub mod usage;

pub use blob::BlobArena;
pub use error::{RepositoryError, Result};
pub use lock::LockManager;
pub use migration::{MigrationFailure, MigrationReport, MigrationRunner};
pub use repository::{Entity, IndexRow, Repository};
pub use session::Session;
pub use sweep::{SweepFailure, SweepReport};
pub use usage::{ScanFailure, UsageInfo, UsageReference, UsageResolver, UsageTarget};
