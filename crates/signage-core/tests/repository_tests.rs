//! Integration tests for the index/detail repositories

use chrono::NaiveDate;
use signage_store_core::config::ConflictPolicy;
use signage_store_core::schema::{
    ContentDraft, ContentPatch, ContentType, LayoutDraft, LayoutPatch, PlaylistDraft, PlaylistItem,
    RegionAssignment, Region, ScheduleDraft, SchedulePatch,
};
use signage_store_core::{Entity, RepositoryError, Session};
use std::fs;
use tempfile::TempDir;

fn session(temp_dir: &TempDir) -> Session {
    Session::new(temp_dir.path(), ConflictPolicy::Warn)
}

fn two_region_layout() -> LayoutDraft {
    let mut draft = LayoutDraft::new("Lobby split");
    draft.regions = vec![
        Region::new("main", "Main", 0, 0, 1280, 1080),
        Region::new("side", "Side", 1280, 0, 640, 1080),
    ];
    draft
}

#[tokio::test]
async fn test_create_then_get_returns_draft_fields() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    let draft = two_region_layout();
    let summary = session.layouts().create(draft.clone()).await.unwrap();
    let layout = session.layouts().get_by_id(&summary.id).await.unwrap().unwrap();

    assert_eq!(layout.id, summary.id);
    assert_eq!(layout.name, draft.name);
    assert_eq!(layout.regions, draft.regions);
    assert_eq!(layout.width, 1920);
    assert_eq!(layout.created_at, layout.updated_at);
    assert_eq!(layout.summarize(), summary);
    assert_eq!(summary.region_count, 2);

    assert_eq!(session.layouts().list_index().await.unwrap(), vec![summary]);
}

#[tokio::test]
async fn test_every_family_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    let mut text = ContentDraft::new("Welcome", ContentType::Text);
    text.body = Some("Hello, visitors".to_string());
    let content = session.contents().create(text).await.unwrap();
    let stored = session.contents().get_by_id(&content.id).await.unwrap().unwrap();
    assert_eq!(stored.body.as_deref(), Some("Hello, visitors"));

    let mut playlist_draft = PlaylistDraft::new("Morning loop");
    playlist_draft.regions = vec![RegionAssignment {
        region_id: "main".to_string(),
        items: vec![PlaylistItem::new(content.id.clone())],
    }];
    let playlist = session.playlists().create(playlist_draft).await.unwrap();
    assert_eq!(playlist.content_count, 1);

    let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let schedule = session
        .schedules()
        .create(ScheduleDraft::new("March", playlist.id.clone(), start))
        .await
        .unwrap();
    let stored = session.schedules().get_by_id(&schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.playlist_id, playlist.id);
    assert_eq!(stored.start_date, start);
}

#[tokio::test]
async fn test_files_follow_documented_layout() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    let summary = session.layouts().create(LayoutDraft::new("Plain")).await.unwrap();

    let index = fs::read_to_string(temp_dir.path().join("layouts/index.json")).unwrap();
    assert!(index.starts_with("[\n  {\n    \"id\""));
    let detail = temp_dir
        .path()
        .join(format!("layouts/layout-{}.json", summary.id));
    assert!(detail.is_file());
}

#[tokio::test]
async fn test_get_absent_or_malformed_id_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    assert!(session.layouts().get_by_id("does-not-exist").await.unwrap().is_none());
    assert!(session.layouts().get_by_id("../contents/index").await.unwrap().is_none());
    assert!(session.layouts().get_by_id("").await.unwrap().is_none());
    assert!(session.contents().list_index().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sequential_updates_see_each_other() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let created = session.layouts().create(two_region_layout()).await.unwrap();

    session
        .layouts()
        .update(
            &created.id,
            LayoutPatch {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = session
        .layouts()
        .update(
            &created.id,
            LayoutPatch {
                description: Some("Second edit".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(second.name, "Renamed");
    let layout = session.layouts().get_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(layout.name, "Renamed");
    assert_eq!(layout.description.as_deref(), Some("Second edit"));
    assert!(layout.updated_at > layout.created_at);

    let rows = session.layouts().list_index().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Renamed");
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    let err = session
        .schedules()
        .update("missing", SchedulePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { ref id, .. } if id == "missing"));
}

#[tokio::test]
async fn test_invalid_update_leaves_record_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let created = session.layouts().create(two_region_layout()).await.unwrap();

    let err = session
        .layouts()
        .update(
            &created.id,
            LayoutPatch {
                width: Some(100),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Schema { .. }));

    let layout = session.layouts().get_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(layout.width, 1920);
}

#[tokio::test]
async fn test_invalid_create_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);

    // Image content without an uploaded file
    let err = session
        .contents()
        .create(ContentDraft::new("Poster", ContentType::Image))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Schema { .. }));
    assert!(!temp_dir.path().join("contents").exists());
}

#[tokio::test]
async fn test_update_restores_missing_index_row() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let created = session.layouts().create(LayoutDraft::new("Survivor")).await.unwrap();

    // Simulate a crash between detail and index writes
    fs::write(temp_dir.path().join("layouts/index.json"), "[]").unwrap();
    assert!(session.layouts().list_index().await.unwrap().is_empty());

    session
        .layouts()
        .update(&created.id, LayoutPatch::default())
        .await
        .unwrap();
    let rows = session.layouts().list_index().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, created.id);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let keep = session.layouts().create(LayoutDraft::new("Keep")).await.unwrap();
    let doomed = session.layouts().create(LayoutDraft::new("Drop")).await.unwrap();

    session.layouts().remove(&doomed.id).await.unwrap();
    session.layouts().remove(&doomed.id).await.unwrap();
    session.layouts().remove("never-existed").await.unwrap();
    session.layouts().remove("../../etc").await.unwrap();

    assert!(session.layouts().get_by_id(&doomed.id).await.unwrap().is_none());
    let ids: Vec<_> = session
        .layouts()
        .list_index()
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(ids, vec![keep.id]);
    assert!(!temp_dir
        .path()
        .join(format!("layouts/layout-{}.json", doomed.id))
        .exists());
}

#[tokio::test]
async fn test_corrupt_detail_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let created = session.layouts().create(LayoutDraft::new("Fragile")).await.unwrap();

    let path = temp_dir
        .path()
        .join(format!("layouts/layout-{}.json", created.id));
    fs::write(&path, r#"{"id": "x", "name": 42}"#).unwrap();

    let err = session.layouts().get_by_id(&created.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Schema { .. }));
}

#[tokio::test]
async fn test_detail_with_foreign_id_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let a = session.layouts().create(LayoutDraft::new("A")).await.unwrap();
    let b = session.layouts().create(LayoutDraft::new("B")).await.unwrap();

    let dir = temp_dir.path().join("layouts");
    fs::copy(
        dir.join(format!("layout-{}.json", a.id)),
        dir.join(format!("layout-{}.json", b.id)),
    )
    .unwrap();

    let err = session.layouts().get_by_id(&b.id).await.unwrap_err();
    assert!(err.to_string().contains("does not match its file name"));
}

#[tokio::test]
async fn test_sweep_orphans_collects_unindexed_details() {
    let temp_dir = TempDir::new().unwrap();
    let session = session(&temp_dir);
    let kept = session.layouts().create(LayoutDraft::new("Kept")).await.unwrap();
    let orphan = session.layouts().create(LayoutDraft::new("Orphan")).await.unwrap();

    // Index row gone, detail left behind: an interrupted remove
    let index_path = temp_dir.path().join("layouts/index.json");
    let rows: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&index_path).unwrap()).unwrap();
    let rows: Vec<_> = rows.into_iter().filter(|row| row["id"] == kept.id.as_str()).collect();
    fs::write(&index_path, serde_json::to_string(&rows).unwrap()).unwrap();
    let orphan_file = temp_dir
        .path()
        .join(format!("layouts/layout-{}.json", orphan.id));

    let preview = session.layouts().sweep_orphans(true).await.unwrap();
    assert!(preview.dry_run);
    assert_eq!(preview.removed, vec![format!("/layouts/layout-{}.json", orphan.id)]);
    assert!(orphan_file.exists());

    let report = session.layouts().sweep_orphans(false).await.unwrap();
    assert_eq!(report.removed.len(), 1);
    assert!(report.is_clean());
    assert!(!orphan_file.exists());
    assert!(session.layouts().get_by_id(&kept.id).await.unwrap().is_some());
}

mod conflicts {
    use super::*;

    async fn seeded(temp_dir: &TempDir, policy: ConflictPolicy) -> (Session, Session, String) {
        let ours = Session::new(temp_dir.path(), policy);
        let theirs = Session::new(temp_dir.path(), policy);

        let mut draft = ContentDraft::new("Menu", ContentType::Url);
        draft.url = Some("https://example.com/menu".to_string());
        let created = ours.contents().create(draft).await.unwrap();
        (ours, theirs, created.id)
    }

    fn rename(name: &str) -> ContentPatch {
        ContentPatch {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reject_policy_refuses_stale_update() {
        let temp_dir = TempDir::new().unwrap();
        let (ours, theirs, id) = seeded(&temp_dir, ConflictPolicy::Reject).await;

        ours.contents().get_by_id(&id).await.unwrap();
        theirs.contents().update(&id, rename("Theirs")).await.unwrap();

        let err = ours.contents().update(&id, rename("Ours")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        let stored = ours.contents().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Theirs");

        // Having re-read, the update goes through
        ours.contents().update(&id, rename("Ours")).await.unwrap();
    }

    #[tokio::test]
    async fn test_warn_policy_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let (ours, theirs, id) = seeded(&temp_dir, ConflictPolicy::Warn).await;

        ours.contents().get_by_id(&id).await.unwrap();
        theirs.contents().update(&id, rename("Theirs")).await.unwrap();
        let summary = ours.contents().update(&id, rename("Ours")).await.unwrap();
        assert_eq!(summary.name, "Ours");
    }

    #[tokio::test]
    async fn test_session_never_conflicts_with_itself() {
        let temp_dir = TempDir::new().unwrap();
        let (ours, _theirs, id) = seeded(&temp_dir, ConflictPolicy::Reject).await;

        for name in ["One", "Two", "Three"] {
            ours.contents().update(&id, rename(name)).await.unwrap();
        }
        assert_eq!(ours.contents().get_by_id(&id).await.unwrap().unwrap().name, "Three");
    }
}
