//! Cross-reference usage queries
//!
//! There is no reverse index. Every query lists the referencing family and
//! loads each detail record in turn, so the cost is one read per playlist (or
//! schedule). A record that fails to load is logged, reported in
//! [`UsageInfo::skipped`], and left out of the totals.

use crate::error::Result;
use crate::repository::{Entity, IndexRow, Repository};
use crate::schema::{Playlist, Schedule};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Kind of entity whose usage is being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageTarget {
    /// Referenced by playlist items
    Content,
    /// Referenced by a playlist's layout
    Layout,
    /// Referenced by schedules
    Playlist,
}

impl fmt::Display for UsageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UsageTarget::Content => "content",
            UsageTarget::Layout => "layout",
            UsageTarget::Playlist => "playlist",
        })
    }
}

impl FromStr for UsageTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" | "contents" => Ok(UsageTarget::Content),
            "layout" | "layouts" => Ok(UsageTarget::Layout),
            "playlist" | "playlists" => Ok(UsageTarget::Playlist),
            other => Err(format!("unknown usage target '{other}'")),
        }
    }
}

/// Result of a usage query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub is_used: bool,
    /// Total number of references across all referencing entities
    pub usage_count: usize,
    pub referencing_entities: Vec<UsageReference>,
    /// Records that could not be loaded and were left out
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanFailure>,
}

/// One entity referencing the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReference {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// References held by this entity
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub id: String,
    pub message: String,
}

/// Answers "who references this entity"
#[derive(Clone)]
pub struct UsageResolver {
    playlists: Repository<Playlist>,
    schedules: Repository<Schedule>,
}

impl UsageResolver {
    pub fn new(playlists: Repository<Playlist>, schedules: Repository<Schedule>) -> Self {
        Self {
            playlists,
            schedules,
        }
    }

    /// Scan for references to `target_id`
    ///
    /// Only a failure to read the index itself is an error.
    pub async fn compute_usage(&self, target_id: &str, target: UsageTarget) -> Result<UsageInfo> {
        let info = match target {
            UsageTarget::Content => {
                scan(&self.playlists, |playlist| {
                    let count = playlist.content_occurrences(target_id);
                    reference(&playlist.id, &playlist.name, playlist.device.as_deref(), count)
                })
                .await?
            }
            UsageTarget::Layout => {
                scan(&self.playlists, |playlist| {
                    let count = usize::from(playlist.layout_id.as_deref() == Some(target_id));
                    reference(&playlist.id, &playlist.name, playlist.device.as_deref(), count)
                })
                .await?
            }
            UsageTarget::Playlist => {
                scan(&self.schedules, |schedule| {
                    let count = usize::from(schedule.playlist_id == target_id);
                    reference(&schedule.id, &schedule.name, schedule.device.as_deref(), count)
                })
                .await?
            }
        };

        debug!(
            target = %target,
            id = target_id,
            usage_count = info.usage_count,
            skipped = info.skipped.len(),
            "Computed usage"
        );
        Ok(info)
    }
}

fn reference(id: &str, name: &str, device: Option<&str>, count: usize) -> Option<UsageReference> {
    (count > 0).then(|| UsageReference {
        id: id.to_string(),
        name: name.to_string(),
        device: device.map(str::to_string),
        count,
    })
}

/// List the index, load each record, and collect matches
async fn scan<E, F>(repository: &Repository<E>, matches: F) -> Result<UsageInfo>
where
    E: Entity,
    F: Fn(&E) -> Option<UsageReference>,
{
    let mut info = UsageInfo::default();

    for row in repository.list_index().await? {
        let id = row.id();
        let loaded = match repository.get_by_id(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(family = %repository.family(), id, "Skipping indexed entry without detail file");
                info.skipped.push(ScanFailure {
                    id: id.to_string(),
                    message: "detail file is missing".to_string(),
                });
                continue;
            }
            Err(e) => {
                warn!(family = %repository.family(), id, error = %e, "Skipping unreadable entry");
                info.skipped.push(ScanFailure {
                    id: id.to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        if let Some(found) = matches(&loaded) {
            info.usage_count += found.count;
            info.referencing_entities.push(found);
        }
    }

    info.is_used = info.usage_count > 0;
    Ok(info)
}
