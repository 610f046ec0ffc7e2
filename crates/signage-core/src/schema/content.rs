//! Content schema: uploaded media, web pages and inline text
//!
//! Two schema versions exist on disk. Version 1 used the content type
//! `website` for web pages; the current version calls it `url`. Stored values
//! are read through [`VersionedContent`] / [`VersionedContentSummary`], and
//! [`ContentTypeV1::upgrade`] is the single place that maps old types to new
//! ones.

use crate::blob::parse_blob_path;
use crate::repository::{Entity, IndexRow};
use crate::schema::Family;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content item (current schema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
    Text,
    Html,
    Csv,
    Url,
}

impl ContentType {
    /// Whether this type is backed by an uploaded blob
    pub fn requires_file(self) -> bool {
        matches!(self, ContentType::Image | ContentType::Video | ContentType::Csv)
    }
}

/// Kind of content item as written by schema version 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentTypeV1 {
    Image,
    Video,
    Text,
    Html,
    Csv,
    /// Deprecated; renamed to `url`
    Website,
}

impl ContentTypeV1 {
    pub fn upgrade(self) -> ContentType {
        match self {
            ContentTypeV1::Image => ContentType::Image,
            ContentTypeV1::Video => ContentType::Video,
            ContentTypeV1::Text => ContentType::Text,
            ContentTypeV1::Html => ContentType::Html,
            ContentTypeV1::Csv => ContentType::Csv,
            ContentTypeV1::Website => ContentType::Url,
        }
    }
}

/// Reference from a content record to its uploaded blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Logical path of the blob (`/contents/<uuid>.<ext>`)
    pub path: String,
    /// File name as uploaded
    pub original_name: String,
    /// Size in bytes
    pub size: u64,
    /// BLAKE3 hex digest of the blob
    pub checksum: String,
}

/// Full content record (current schema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MediaFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline text or markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Default display duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content record as written by schema version 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentV1 {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentTypeV1,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<MediaFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentV1 {
    pub fn upgrade(self) -> Content {
        Content {
            id: self.id,
            name: self.name,
            description: self.description,
            content_type: self.content_type.upgrade(),
            file: self.file,
            url: self.url,
            body: self.body,
            duration_secs: self.duration_secs,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A stored content record of any known schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionedContent {
    Current(Content),
    V1(ContentV1),
}

impl VersionedContent {
    pub fn is_legacy(&self) -> bool {
        !matches!(self, VersionedContent::Current(_))
    }

    pub fn upgrade(self) -> Content {
        match self {
            VersionedContent::Current(content) => content,
            VersionedContent::V1(content) => content.upgrade(),
        }
    }
}

/// Index row for a content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Index row as written by schema version 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummaryV1 {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: ContentTypeV1,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored content index row of any known schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionedContentSummary {
    Current(ContentSummary),
    V1(ContentSummaryV1),
}

impl VersionedContentSummary {
    pub fn id(&self) -> &str {
        match self {
            VersionedContentSummary::Current(row) => &row.id,
            VersionedContentSummary::V1(row) => &row.id,
        }
    }

    /// Whether this row still carries a deprecated type marker
    pub fn is_legacy(&self) -> bool {
        !matches!(self, VersionedContentSummary::Current(_))
    }
}

/// Payload for creating a content record
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub name: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub file: Option<MediaFile>,
    pub url: Option<String>,
    pub body: Option<String>,
    pub duration_secs: Option<u32>,
    pub tags: Vec<String>,
}

impl ContentDraft {
    pub fn new(name: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            name: name.into(),
            description: None,
            content_type,
            file: None,
            url: None,
            body: None,
            duration_secs: None,
            tags: Vec::new(),
        }
    }
}

/// Partial update for a content record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file: Option<MediaFile>,
    pub url: Option<String>,
    pub body: Option<String>,
    pub duration_secs: Option<u32>,
    pub tags: Option<Vec<String>>,
}

impl IndexRow for ContentSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Content {
    type Summary = ContentSummary;
    type Draft = ContentDraft;
    type Patch = ContentPatch;

    const FAMILY: Family = Family::Contents;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: String, draft: ContentDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            content_type: draft.content_type,
            file: draft.file,
            url: draft.url,
            body: draft.body,
            duration_secs: draft.duration_secs,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(file) = patch.file {
            self.file = Some(file);
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
        if let Some(body) = patch.body {
            self.body = Some(body);
        }
        if let Some(duration) = patch.duration_secs {
            self.duration_secs = Some(duration);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }

    fn summarize(&self) -> ContentSummary {
        ContentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            content_type: self.content_type,
            file_path: self.file.as_ref().map(|f| f.path.clone()),
            size: self.file.as_ref().map(|f| f.size),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.content_type.requires_file() && self.file.is_none() {
            return Err(format!("{:?} content requires an uploaded file", self.content_type));
        }
        if let Some(file) = &self.file
            && let Err(e) = parse_blob_path(&file.path)
        {
            return Err(format!("file path is not a stored blob: {e}"));
        }
        if self.content_type == ContentType::Url
            && self.url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err("url content requires a url".to_string());
        }
        if self.content_type == ContentType::Text && self.body.is_none() {
            return Err("text content requires a body".to_string());
        }
        if self.duration_secs == Some(0) {
            return Err("durationSecs must be greater than zero".to_string());
        }
        Ok(())
    }
}
