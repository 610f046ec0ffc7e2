//! Playlist schema: content assigned to the regions of a layout

use crate::repository::{Entity, IndexRow};
use crate::schema::Family;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One content item in a region's rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_id: String,
    /// Overrides the content's default duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl PlaylistItem {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            duration_secs: None,
        }
    }
}

/// Ordered content for one layout region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAssignment {
    pub region_id: String,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

/// Full playlist record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Screen or player this playlist is meant for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(default)]
    pub regions: Vec<RegionAssignment>,
    #[serde(default = "default_loop")]
    pub loop_playback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_loop() -> bool {
    true
}

impl Playlist {
    /// Number of items referencing `content_id` across all regions
    pub fn content_occurrences(&self, content_id: &str) -> usize {
        self.regions
            .iter()
            .flat_map(|region| &region.items)
            .filter(|item| item.content_id == content_id)
            .count()
    }

    /// Total number of items across all regions
    pub fn content_count(&self) -> usize {
        self.regions.iter().map(|region| region.items.len()).sum()
    }
}

/// Index row for a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    pub region_count: usize,
    pub content_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDraft {
    pub name: String,
    pub description: Option<String>,
    pub device: Option<String>,
    pub layout_id: Option<String>,
    pub regions: Vec<RegionAssignment>,
    pub loop_playback: bool,
}

impl PlaylistDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            device: None,
            layout_id: None,
            regions: Vec::new(),
            loop_playback: true,
        }
    }
}

/// Partial update for a playlist. `regions` replaces every assignment.
///
/// Nullable fields take `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub device: Option<Option<String>>,
    pub layout_id: Option<Option<String>>,
    pub regions: Option<Vec<RegionAssignment>>,
    pub loop_playback: Option<bool>,
}

impl IndexRow for PlaylistSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Playlist {
    type Summary = PlaylistSummary;
    type Draft = PlaylistDraft;
    type Patch = PlaylistPatch;

    const FAMILY: Family = Family::Playlists;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: String, draft: PlaylistDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            device: draft.device,
            layout_id: draft.layout_id,
            regions: draft.regions,
            loop_playback: draft.loop_playback,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PlaylistPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(device) = patch.device {
            self.device = device;
        }
        if let Some(layout_id) = patch.layout_id {
            self.layout_id = layout_id;
        }
        if let Some(regions) = patch.regions {
            self.regions = regions;
        }
        if let Some(loop_playback) = patch.loop_playback {
            self.loop_playback = loop_playback;
        }
        self.updated_at = now;
    }

    fn summarize(&self) -> PlaylistSummary {
        PlaylistSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            device: self.device.clone(),
            layout_id: self.layout_id.clone(),
            region_count: self.regions.len(),
            content_count: self.content_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.region_id.as_str()) {
                return Err(format!("region '{}' is assigned twice", region.region_id));
            }
            for item in &region.items {
                if item.content_id.is_empty() {
                    return Err(format!("region '{}' has an item without content", region.region_id));
                }
                if item.duration_secs == Some(0) {
                    return Err(format!(
                        "item '{}' in region '{}' has a zero duration",
                        item.content_id, region.region_id
                    ));
                }
            }
        }
        Ok(())
    }
}
