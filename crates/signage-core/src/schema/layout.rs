//! Layout schema: a screen canvas split into regions

use crate::repository::{Entity, IndexRow};
use crate::schema::Family;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Screen orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// A rectangular area of the canvas that plays its own content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub z_index: i32,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            width,
            height,
            z_index: 0,
        }
    }
}

/// Full layout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub regions: Vec<Region>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Index row for a layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub id: String,
    pub name: String,
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    pub region_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a layout
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDraft {
    pub name: String,
    pub description: Option<String>,
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    pub regions: Vec<Region>,
}

impl LayoutDraft {
    /// A full-HD landscape canvas with no regions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            orientation: Orientation::Landscape,
            width: 1920,
            height: 1080,
            regions: Vec::new(),
        }
    }
}

/// Partial update for a layout. `regions` replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub orientation: Option<Orientation>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub regions: Option<Vec<Region>>,
}

impl IndexRow for LayoutSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Layout {
    type Summary = LayoutSummary;
    type Draft = LayoutDraft;
    type Patch = LayoutPatch;

    const FAMILY: Family = Family::Layouts;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: String, draft: LayoutDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            orientation: draft.orientation,
            width: draft.width,
            height: draft.height,
            regions: draft.regions,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: LayoutPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(orientation) = patch.orientation {
            self.orientation = orientation;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(regions) = patch.regions {
            self.regions = regions;
        }
        self.updated_at = now;
    }

    fn summarize(&self) -> LayoutSummary {
        LayoutSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            orientation: self.orientation,
            width: self.width,
            height: self.height,
            region_count: self.regions.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err("canvas width and height must be greater than zero".to_string());
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(format!("duplicate region id '{}'", region.id));
            }
            if region.width == 0 || region.height == 0 {
                return Err(format!("region '{}' has zero size", region.id));
            }
            let right = u64::from(region.x) + u64::from(region.width);
            let bottom = u64::from(region.y) + u64::from(region.height);
            if right > u64::from(self.width) || bottom > u64::from(self.height) {
                return Err(format!(
                    "region '{}' extends beyond the {}x{} canvas",
                    region.id, self.width, self.height
                ));
            }
        }
        Ok(())
    }
}
