//! Entity schemas for the four families
//!
//! All records serialize with camelCase keys and RFC 3339 timestamps.

pub mod content;
pub mod family;
pub mod layout;
pub mod playlist;
pub mod schedule;

pub use content::{
    Content, ContentDraft, ContentPatch, ContentSummary, ContentSummaryV1, ContentType, ContentTypeV1,
    ContentV1, MediaFile, VersionedContent, VersionedContentSummary,
};
pub use family::{Family, is_valid_id};
pub use layout::{Layout, LayoutDraft, LayoutPatch, LayoutSummary, Orientation, Region};
pub use playlist::{Playlist, PlaylistDraft, PlaylistItem, PlaylistPatch, PlaylistSummary, RegionAssignment};
pub use schedule::{Schedule, ScheduleDraft, SchedulePatch, ScheduleSummary, Weekday};
