use colabme::id::{Id, IdBuf};
use log::Level;

use crate::{harness, stubs::remote::Call};

fn id(id: &str) -> IdBuf {
    IdBuf::from(id)
}

#[tokio::test]
async fn commit_new_file() {
    let mut h = harness().await;

    let summary = h.reconcile(&["a.txt"]).await;

    assert_eq!(summary.uploaded, 1);
    assert_eq!(
        h.remote.calls(),
        vec![Call::CreateFile {
            parent_id: None,
            path: h.path("a.txt")
        }]
    );
    assert_eq!(h.store.entries().len(), 1);
    let entry = h.entry("a.txt").unwrap();
    assert_eq!(entry.remote_id(), Some(Id::new("/a.txt")));
    assert_eq!(entry.last_synced(), Some(h.mtime("a.txt")));
    assert_eq!(
        h.remote.content(Id::new("/a.txt")).await.as_deref(),
        Some("/a.txt")
    );
}

#[tokio::test]
async fn commit_directory_recurses() {
    let mut h = harness().await;

    let summary = h.reconcile(&["dir"]).await;

    assert_eq!(summary.created, 2);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(
        h.remote.calls(),
        vec![
            Call::MkDir {
                parent_id: None,
                name: "dir".into()
            },
            Call::MkDir {
                parent_id: Some(id("/dir")),
                name: "deep".into()
            },
            Call::CreateFile {
                parent_id: Some(id("/dir/deep")),
                path: h.path("dir/deep/f.txt")
            },
            Call::CreateFile {
                parent_id: Some(id("/dir")),
                path: h.path("dir/e.txt")
            },
        ]
    );
    assert_eq!(h.store.entries().len(), 4);
    assert_eq!(h.entry("dir").unwrap().last_synced(), None);
    assert_eq!(
        h.entry("dir/deep").unwrap().parent_id(),
        Some(Id::new("/dir"))
    );
    assert_eq!(
        h.remote.content(Id::new("/dir/deep/f.txt")).await.as_deref(),
        Some("/dir/deep/f.txt")
    );
}

#[tokio::test]
async fn commit_is_idempotent() {
    let mut h = harness().await;
    h.reconcile(&["a.txt", "flat"]).await;
    let store = h.store.clone();
    h.remote.clear_calls();

    let summary = h.reconcile(&["a.txt", "flat"]).await;

    assert!(h.remote.calls().is_empty());
    assert_eq!(summary.unchanged, 3);
    assert_eq!(summary.uploaded + summary.created, 0);
    assert_eq!(h.store, store);
}

#[tokio::test]
async fn touched_file_is_replaced() {
    let mut h = harness().await;
    h.reconcile(&["a.txt"]).await;
    let before = h.entry("a.txt").unwrap().last_synced().unwrap();
    h.touch("a.txt");
    h.remote.clear_calls();

    let summary = h.reconcile(&["a.txt"]).await;

    assert_eq!(summary.uploaded, 1);
    assert_eq!(
        h.remote.calls(),
        vec![
            Call::Delete(id("/a.txt")),
            Call::CreateFile {
                parent_id: None,
                path: h.path("a.txt")
            },
        ]
    );
    let synced = h.entry("a.txt").unwrap().last_synced().unwrap();
    assert!(synced > before);
    assert_eq!(synced, h.mtime("a.txt"));
    assert_eq!(h.store.entries().len(), 1);
}

#[tokio::test]
async fn update_all_refreshes_stale_files() {
    let mut h = harness().await;
    h.reconcile(&["a.txt", "flat"]).await;
    h.touch("flat/c.txt");
    h.remote.clear_calls();

    let summary = h.update_all().await;

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.unchanged, 2);
    assert_eq!(
        h.remote.calls(),
        vec![
            Call::Delete(id("/flat/c.txt")),
            Call::CreateFile {
                parent_id: Some(id("/flat")),
                path: h.path("flat/c.txt")
            },
        ]
    );
    assert_eq!(
        h.entry("flat/c.txt").unwrap().last_synced(),
        Some(h.mtime("flat/c.txt"))
    );
}

#[tokio::test]
async fn update_all_does_not_discover_files() {
    let mut h = harness().await;
    h.reconcile(&["flat"]).await;
    tokio::fs::write(h.path("flat/new.txt"), "new").await.unwrap();
    h.remote.clear_calls();

    h.update_all().await;

    assert!(h.remote.calls().is_empty());
    assert!(h.entry("flat/new.txt").is_none());
}

#[tokio::test]
async fn ignored_file_is_not_uploaded() {
    let mut h = harness().await;
    let path = h.path("a.txt");
    h.store.ignore_paths([&path]).unwrap();

    let summary = h.reconcile(&["a.txt"]).await;

    assert!(h.remote.calls().is_empty());
    assert_eq!(summary.skipped, 1);
    assert!(h.entry("a.txt").is_none());

    h.store.unignore_paths([&path]).unwrap();
    h.reconcile(&["a.txt"]).await;
    assert!(h.entry("a.txt").unwrap().is_uploaded());
}

#[tokio::test]
async fn ignored_child_is_skipped() {
    let mut h = harness().await;
    let path = h.path("flat/c.txt");
    h.store.ignore_paths([path]).unwrap();

    h.reconcile(&["flat"]).await;

    assert_eq!(
        h.remote.calls(),
        vec![
            Call::MkDir {
                parent_id: None,
                name: "flat".into()
            },
            Call::CreateFile {
                parent_id: Some(id("/flat")),
                path: h.path("flat/d.txt")
            },
        ]
    );
    assert!(h.entry("flat/c.txt").is_none());
}

#[tokio::test]
async fn tracker_dir_is_excluded() {
    let mut h = harness().await;
    let tracker_dir = colabme::loc::tracker_dir(&h.root);
    h.store.save(&colabme::loc::tracker_file(&h.root)).await.unwrap();
    let root = h.root.clone();

    h.session()
        .exclude(tracker_dir.clone())
        .reconcile([&root], None)
        .await;

    assert!(!h.remote.calls().is_empty());
    assert!(h.remote.calls().iter().all(|call| match call {
        Call::CreateFile { path, .. } => !path.starts_with(&tracker_dir),
        Call::MkDir { name, .. } => name != colabme::loc::TRACKER_DIR,
        Call::Delete(_) => false,
    }));
    assert!(h
        .store
        .entries()
        .iter()
        .all(|e| !e.path().starts_with(&tracker_dir)));
    assert!(h.entry("dir/deep/f.txt").unwrap().is_uploaded());
}

#[tokio::test]
async fn vanished_file_is_skipped() {
    let mut h = harness().await;
    h.reconcile(&["a.txt"]).await;
    tokio::fs::remove_file(h.path("a.txt")).await.unwrap();
    h.remote.clear_calls();

    let summary = h.reconcile(&["a.txt"]).await;

    assert_eq!(summary.skipped, 1);
    assert!(h.remote.calls().is_empty());
    assert_eq!(h.report.count(Level::Warn), 1);

    // can still be removed
    let summary = h.remove(&["a.txt"]).await;
    assert_eq!(summary.deleted, 1);
    assert_eq!(h.remote.calls(), vec![Call::Delete(id("/a.txt"))]);
    assert!(h.store.entries().is_empty());
}

#[tokio::test]
async fn remove_directory_untracks_children() {
    let mut h = harness().await;
    h.reconcile(&["a.txt", "flat"]).await;
    let flat_id = h.remote_id("flat");
    h.remote.clear_calls();

    let summary = h.remove(&["flat"]).await;

    assert_eq!(summary.deleted, 1);
    assert_eq!(h.remote.calls(), vec![Call::Delete(flat_id.clone())]);
    assert!(!h.remote.exists(&flat_id));
    assert_eq!(h.store.entries().len(), 1);
    assert!(h.entry("a.txt").is_some());
}

#[tokio::test]
async fn remove_untracked_warns() {
    let mut h = harness().await;

    let summary = h.remove(&["untracked.txt"]).await;

    assert_eq!(summary.skipped, 1);
    assert!(h.remote.calls().is_empty());
    assert!(h.store.entries().is_empty());
    assert_eq!(h.report.count(Level::Warn), 1);
}

#[tokio::test]
async fn remove_all_prunes_cascaded_entries() {
    let mut h = harness().await;
    h.reconcile(&["a.txt", "flat"]).await;
    h.remote.clear_calls();

    let summary = h.remove_all().await;

    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        h.remote.calls(),
        vec![Call::Delete(id("/a.txt")), Call::Delete(id("/flat"))]
    );
    assert!(h.store.entries().is_empty());
    assert_eq!(h.report.count(Level::Warn), 0);
}

#[tokio::test]
async fn failed_remote_call_keeps_entry() {
    let mut h = harness().await;
    h.reconcile(&["a.txt"]).await;
    let before = h.entry("a.txt").unwrap().clone();
    h.touch("a.txt");
    h.remote.set_fail(true);
    h.remote.clear_calls();

    let summary = h.reconcile(&["a.txt", "b.txt"]).await;

    assert_eq!(summary.failed, 2);
    assert_eq!(h.report.count(Level::Error), 2);
    assert_eq!(h.entry("a.txt"), Some(&before));
    assert!(h.entry("b.txt").is_none());

    h.remote.set_fail(false);
    h.remote.clear_calls();
    let summary = h.reconcile(&["a.txt", "b.txt"]).await;

    assert_eq!(summary.uploaded, 2);
    assert_eq!(h.remote.calls().len(), 3);
    assert_eq!(
        h.entry("a.txt").unwrap().last_synced(),
        Some(h.mtime("a.txt"))
    );
}

#[tokio::test]
async fn snapshot_round_trip() {
    let mut h = harness().await;
    h.reconcile(&["a.txt", "dir"]).await;
    let path = h.path("b.txt");
    h.store.ignore_paths([path]).unwrap();

    let tracker_file = colabme::loc::tracker_file(&h.root);
    h.store.save(&tracker_file).await.unwrap();
    let loaded = colabme::RecordStore::load(&tracker_file).await.unwrap();

    assert_eq!(loaded, h.store);

    // a reloaded store sees no change to upload
    h.store = loaded;
    h.remote.clear_calls();
    h.reconcile(&["a.txt", "dir"]).await;
    assert!(h.remote.calls().is_empty());
}

#[tokio::test]
async fn remove_directory_untracks_direct_children_only() {
    let mut h = harness().await;
    h.reconcile(&["dir"]).await;
    h.remote.clear_calls();

    let summary = h.remove(&["dir"]).await;

    assert_eq!(summary.deleted, 1);
    assert_eq!(h.remote.calls(), vec![Call::Delete(id("/dir"))]);
    assert!(h.entry("dir").is_none());
    assert!(h.entry("dir/e.txt").is_none());
    assert!(h.entry("dir/deep").is_none());
    // grandchildren keep their entry
    assert_eq!(h.store.entries().len(), 1);
    assert!(h.entry("dir/deep/f.txt").unwrap().is_uploaded());
}

#[tokio::test]
async fn remove_all_over_nested_directories() {
    let mut h = harness().await;
    h.reconcile(&["dir"]).await;
    h.remote.clear_calls();

    let summary = h.remove_all().await;

    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        h.remote.calls(),
        vec![Call::Delete(id("/dir")), Call::Delete(id("/dir/deep/f.txt"))]
    );
    assert!(h.store.entries().is_empty());
    assert_eq!(h.report.count(Level::Warn), 0);
}

#[tokio::test]
async fn commit_parent_adopts_tracked_children() {
    let mut h = harness().await;
    h.reconcile(&["flat/c.txt", "dir/deep"]).await;
    assert_eq!(h.entry("flat/c.txt").unwrap().parent_id(), None);
    h.remote.clear_calls();

    let summary = h.reconcile(&["flat", "dir"]).await;

    assert_eq!(summary.created, 2);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.unchanged, 2);
    assert_eq!(
        h.entry("flat/c.txt").unwrap().parent_id(),
        Some(Id::new("/flat"))
    );
    assert_eq!(
        h.entry("dir/deep").unwrap().parent_id(),
        Some(Id::new("/dir"))
    );
    // the remote copies were not moved
    assert_eq!(h.remote_id("flat/c.txt"), id("/c.txt"));
    assert_eq!(h.remote_id("dir/deep"), id("/deep"));

    h.remote.clear_calls();
    let summary = h.remove(&["flat", "dir"]).await;

    assert_eq!(summary.deleted, 2);
    assert!(h.entry("flat/c.txt").is_none());
    assert!(h.entry("dir/deep").is_none());
    assert_eq!(h.store.entries().len(), 1);
    assert!(h.entry("dir/deep/f.txt").is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_cycle_is_skipped() {
    let mut h = harness().await;
    std::os::unix::fs::symlink(h.path("flat"), h.path("flat/loop")).unwrap();

    let summary = h.reconcile(&["flat"]).await;

    assert_eq!(summary.created, 1);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(h.report.count(Level::Warn), 1);
    assert_eq!(
        h.remote.calls(),
        vec![
            Call::MkDir {
                parent_id: None,
                name: "flat".into()
            },
            Call::CreateFile {
                parent_id: Some(id("/flat")),
                path: h.path("flat/c.txt")
            },
            Call::CreateFile {
                parent_id: Some(id("/flat")),
                path: h.path("flat/d.txt")
            },
        ]
    );
    assert_eq!(h.entry("flat").unwrap().parent_id(), None);
    assert!(h.entry("flat/loop").is_none());
    assert_eq!(h.store.entries().len(), 3);
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_file_is_tracked_at_its_target() {
    let mut h = harness().await;
    std::os::unix::fs::symlink(h.path("a.txt"), h.path("flat/alias.txt")).unwrap();

    h.reconcile(&["flat"]).await;

    assert!(h.remote.calls().contains(&Call::CreateFile {
        parent_id: Some(id("/flat")),
        path: h.path("a.txt")
    }));
    assert!(h.entry("flat/alias.txt").is_none());
    assert_eq!(h.entry("a.txt").unwrap().parent_id(), Some(Id::new("/flat")));
    assert_eq!(
        h.remote.content(Id::new("/flat/a.txt")).await.as_deref(),
        Some("/a.txt")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_directory_is_tracked_at_its_target() {
    let mut h = harness().await;
    std::os::unix::fs::symlink(h.path("dir"), h.path("link")).unwrap();

    let summary = h.reconcile(&["link"]).await;

    assert_eq!(summary.created, 2);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(
        h.remote.calls()[0],
        Call::MkDir {
            parent_id: None,
            name: "dir".into()
        }
    );
    assert!(h.entry("link").is_none());
    assert!(h.entry("dir/deep/f.txt").unwrap().is_uploaded());
}
