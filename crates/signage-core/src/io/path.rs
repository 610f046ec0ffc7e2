//! Slash-delimited logical paths inside the store root

use crate::io::error::{StoreError, StoreResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// A validated, root-relative location in the store
///
/// Leading and trailing slashes are ignored, so `/contents/index.json` and
/// `contents/index.json` name the same file. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// The store root
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// A single top-level directory known to be valid at compile time
    pub(crate) fn top_level(dir: &'static str) -> Self {
        debug_assert!(validate_segment(dir, dir).is_ok());
        Self {
            segments: vec![dir.to_string()],
        }
    }

    /// Parse and validate a logical path
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment(raw, segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Append one segment
    pub fn join(&self, segment: &str) -> StoreResult<Self> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// The path without its last segment, or `None` at the root
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// The last segment, or `None` at the root
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Map onto a filesystem path below `root`
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl serde::Serialize for LogicalPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn validate_segment(raw: &str, segment: &str) -> StoreResult<()> {
    let reason = if segment.is_empty() {
        Some("empty segment")
    } else if segment == "." || segment == ".." {
        Some("relative segments are not allowed")
    } else if segment.contains('/') || segment.contains('\\') {
        Some("segment contains a separator")
    } else if segment.contains('\0') {
        Some("segment contains NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
