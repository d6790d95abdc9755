//! Filesystem-backed store behavior: key/path mapping, marker directories,
//! listing projection, and the folder operations end to end on disk.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;

use cloudfiles::storage_ops::folder_ops::FolderOps;
use cloudfiles::storage_ops::handler_utils::AppError;
use cloudfiles::storage_ops::store::{
    ByteStream, ListMode, LocalStore, ObjectEntry, ObjectStore, PutOptions,
};

fn chunked(chunks: &'static [&'static [u8]]) -> ByteStream {
    Box::pin(futures_util::stream::iter(
        chunks.iter().copied().map(|c| anyhow::Ok(Bytes::from_static(c))),
    ))
}

fn one_shot(data: &'static [u8]) -> ByteStream {
    Box::pin(futures_util::stream::once(async move {
        anyhow::Ok(Bytes::from_static(data))
    }))
}

async fn put(store: &LocalStore, key: &str, data: &'static [u8]) {
    store
        .put_stream(key, PutOptions::default(), one_shot(data))
        .await
        .unwrap();
}

async fn collect(store: &LocalStore, prefix: &str, mode: ListMode) -> Vec<ObjectEntry> {
    let mut stream = store.list(prefix, mode).await.unwrap();
    let mut out = Vec::new();
    while let Some(entry) = stream.next().await {
        out.push(entry.unwrap());
    }
    out
}

async fn read_all(store: &LocalStore, key: &str) -> Vec<u8> {
    let mut result = store.get_stream(key).await.unwrap();
    let mut out = Vec::new();
    while let Some(chunk) = result.body.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

#[tokio::test]
async fn put_then_get_roundtrips_chunked_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());

    store
        .put_stream(
            "user-1-files/docs/a.bin",
            PutOptions {
                content_length: Some(6),
                content_type: None,
            },
            chunked(&[b"abc", b"def"]),
        )
        .await
        .unwrap();

    assert_eq!(read_all(&store, "user-1-files/docs/a.bin").await, b"abcdef");
}

#[tokio::test]
async fn length_mismatch_fails_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());

    let err = store
        .put_stream(
            "user-1-files/a.bin",
            PutOptions {
                content_length: Some(99),
                content_type: None,
            },
            chunked(&[b"abc"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Neither the object nor a temp leftover exists.
    assert!(store.get_stream("user-1-files/a.bin").await.is_err());
    let entries = collect(&store, "user-1-files/", ListMode::Shallow).await;
    assert!(entries.is_empty(), "unexpected entries: {entries:?}");
}

#[tokio::test]
async fn marker_key_materializes_as_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());

    store
        .put_stream(
            "user-1-files/docs/",
            PutOptions::default(),
            Box::pin(futures_util::stream::empty()),
        )
        .await
        .unwrap();

    let entries = collect(&store, "user-1-files/", ListMode::Shallow).await;
    assert_eq!(
        entries,
        vec![ObjectEntry {
            key: "user-1-files/docs/".to_string(),
            size: 0,
            is_prefix: true,
        }]
    );
}

#[tokio::test]
async fn shallow_listing_reports_common_prefixes_and_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    put(&store, "user-1-files/a/x.txt", b"deep").await;
    put(&store, "user-1-files/y.txt", b"nearby").await;

    let entries = collect(&store, "user-1-files/", ListMode::Shallow).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "user-1-files/a/");
    assert!(entries[0].is_prefix);
    assert_eq!(entries[1].key, "user-1-files/y.txt");
    assert_eq!(entries[1].size, 6);
    assert!(!entries[1].is_prefix);
}

#[tokio::test]
async fn recursive_listing_emits_directory_markers_after_their_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    put(&store, "user-1-files/a/b/x.txt", b"x").await;

    let keys: Vec<String> = collect(&store, "user-1-files/", ListMode::Recursive)
        .await
        .into_iter()
        .map(|e| e.key)
        .collect();

    assert_eq!(
        keys,
        vec![
            "user-1-files/a/b/x.txt".to_string(),
            "user-1-files/a/b/".to_string(),
            "user-1-files/a/".to_string(),
            "user-1-files/".to_string(),
        ]
    );
}

#[tokio::test]
async fn absent_prefix_lists_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    assert!(collect(&store, "user-1-files/nope/", ListMode::Recursive)
        .await
        .is_empty());
}

#[tokio::test]
async fn copy_of_missing_source_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    let err = store
        .copy("user-1-files/ghost", "user-1-files/copy")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_of_absent_key_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.delete("user-1-files/ghost").await.unwrap();
    store.delete("user-1-files/ghost/").await.unwrap();
}

#[tokio::test]
async fn recursive_delete_clears_the_tree_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
    let ops = FolderOps::new(store.clone());

    ops.create_folder("user-1-files/docs/empty").await.unwrap();
    let local = LocalStore::new(dir.path());
    put(&local, "user-1-files/docs/a.txt", b"a").await;
    put(&local, "user-1-files/docs/sub/b.txt", b"b").await;

    ops.delete_recursive("user-1-files/docs").await.unwrap();

    assert!(!dir.path().join("user-1-files/docs").exists());
    assert!(dir.path().join("user-1-files").exists());
}

#[tokio::test]
async fn tmp_suffix_object_is_listed_and_survives_a_folder_move() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
    let local = LocalStore::new(dir.path());
    put(&local, "user-1-files/a/b/notes.tmp", b"scratch").await;

    let keys: Vec<String> = collect(&local, "user-1-files/a/b/", ListMode::Shallow)
        .await
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["user-1-files/a/b/notes.tmp".to_string()]);

    FolderOps::new(store.clone())
        .move_folder("user-1-files/a/b", "user-1-files/c")
        .await
        .unwrap();

    assert_eq!(read_all(&local, "user-1-files/c/b/notes.tmp").await, b"scratch");
    assert!(!dir.path().join("user-1-files/a/b").exists());
}

#[tokio::test]
async fn in_flight_upload_files_are_hidden_from_listings() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    put(&store, "user-1-files/a.txt", b"done").await;

    // A crashed upload leaves its uniquely named temp file behind.
    let leftover = format!("a.txt.{}.tmp", uuid::Uuid::new_v4());
    std::fs::write(dir.path().join("user-1-files").join(leftover), b"partial").unwrap();

    for mode in [ListMode::Shallow, ListMode::Recursive] {
        let keys: Vec<String> = collect(&store, "user-1-files/", mode)
            .await
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert!(keys.contains(&"user-1-files/a.txt".to_string()));
        assert!(
            !keys.iter().any(|k| k.ends_with(".tmp")),
            "temp leftover leaked into {mode:?} listing: {keys:?}"
        );
    }
}

#[tokio::test]
async fn move_folder_relocates_the_subtree_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
    let local = LocalStore::new(dir.path());
    put(&local, "user-1-files/a/b/x.txt", b"12345").await;
    put(&local, "user-1-files/a/b/c/y.txt", b"123").await;

    FolderOps::new(store.clone())
        .move_folder("user-1-files/a/b", "user-1-files/z")
        .await
        .unwrap();

    assert_eq!(read_all(&local, "user-1-files/z/b/x.txt").await, b"12345");
    assert_eq!(read_all(&local, "user-1-files/z/b/c/y.txt").await, b"123");
    assert!(!dir.path().join("user-1-files/a/b").exists());
}
