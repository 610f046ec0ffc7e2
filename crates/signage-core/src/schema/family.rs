//! Entity families and their on-disk layout

use crate::io::{LogicalPath, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four entity families kept in the store
///
/// Each family owns a directory holding `index.json` plus one
/// `<prefix>-<id>.json` detail file per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Contents,
    Layouts,
    Playlists,
    Schedules,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Contents,
        Family::Layouts,
        Family::Playlists,
        Family::Schedules,
    ];

    /// Directory name under the store root
    pub fn dir(self) -> &'static str {
        match self {
            Family::Contents => "contents",
            Family::Layouts => "layouts",
            Family::Playlists => "playlists",
            Family::Schedules => "schedules",
        }
    }

    /// Detail file prefix (`content` in `content-<id>.json`)
    pub fn record_prefix(self) -> &'static str {
        match self {
            Family::Contents => "content",
            Family::Layouts => "layout",
            Family::Playlists => "playlist",
            Family::Schedules => "schedule",
        }
    }

    /// Lock key shared by every index and detail operation of this family
    pub fn lock_key(self) -> String {
        format!("{}-index", self.dir())
    }

    pub fn dir_path(self) -> LogicalPath {
        LogicalPath::top_level(self.dir())
    }

    pub fn index_path(self) -> StoreResult<LogicalPath> {
        self.dir_path().join("index.json")
    }

    pub fn detail_path(self, id: &str) -> StoreResult<LogicalPath> {
        self.dir_path()
            .join(&format!("{}-{id}.json", self.record_prefix()))
    }

    /// Extract the id from a detail file name, if it is one of ours
    pub fn id_from_detail_name(self, file_name: &str) -> Option<&str> {
        file_name
            .strip_prefix(self.record_prefix())?
            .strip_prefix('-')?
            .strip_suffix(".json")
            .filter(|id| is_valid_id(id))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contents" | "content" => Ok(Family::Contents),
            "layouts" | "layout" => Ok(Family::Layouts),
            "playlists" | "playlist" => Ok(Family::Playlists),
            "schedules" | "schedule" => Ok(Family::Schedules),
            other => Err(format!("unknown family '{other}'")),
        }
    }
}

/// Whether `id` can be embedded in a detail file name
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
