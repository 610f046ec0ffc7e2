//! Schedule schema: when a playlist runs on a device

use crate::repository::{Entity, IndexRow};
use crate::schema::Family;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Day of the week a schedule is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Full schedule record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub playlist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// Empty means every day
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

/// Index row for a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub id: String,
    pub name: String,
    pub playlist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub enabled: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub name: String,
    pub playlist_id: String,
    pub device: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub days: Vec<Weekday>,
    pub priority: i32,
    pub enabled: bool,
}

impl ScheduleDraft {
    /// An always-on schedule starting at `start_date`
    pub fn new(name: impl Into<String>, playlist_id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            playlist_id: playlist_id.into(),
            device: None,
            start_date,
            end_date: None,
            start_time: None,
            end_time: None,
            days: Vec::new(),
            priority: 0,
            enabled: true,
        }
    }
}

/// Partial update for a schedule
///
/// Nullable fields take `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub playlist_id: Option<String>,
    pub device: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub days: Option<Vec<Weekday>>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
}

impl IndexRow for ScheduleSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Schedule {
    type Summary = ScheduleSummary;
    type Draft = ScheduleDraft;
    type Patch = SchedulePatch;

    const FAMILY: Family = Family::Schedules;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: String, draft: ScheduleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            playlist_id: draft.playlist_id,
            device: draft.device,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            days: draft.days,
            priority: draft.priority,
            enabled: draft.enabled,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: SchedulePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(playlist_id) = patch.playlist_id {
            self.playlist_id = playlist_id;
        }
        if let Some(device) = patch.device {
            self.device = device;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(days) = patch.days {
            self.days = days;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        self.updated_at = now;
    }

    fn summarize(&self) -> ScheduleSummary {
        ScheduleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            playlist_id: self.playlist_id.clone(),
            device: self.device.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            enabled: self.enabled,
            priority: self.priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.playlist_id.is_empty() {
            return Err("playlistId must not be empty".to_string());
        }
        if let Some(end_date) = self.end_date
            && end_date < self.start_date
        {
            return Err(format!("endDate {end_date} is before startDate {}", self.start_date));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time)
            && start >= end
        {
            return Err(format!("startTime {start} must be before endTime {end}"));
        }
        Ok(())
    }
}
