//! Record store integration tests against a live Redis.

use clipsmith_models::{CaptionSegment, VideoId, VideoRecord, VideoStatus};
use clipsmith_store::{CaptionStore, RedisStore, StoreError, VideoStore};

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_record_roundtrip_and_cas() {
    dotenvy::dotenv().ok();

    let store = RedisStore::from_env().expect("Failed to create store");

    let record = VideoRecord::new(VideoId::new(), "Integration", "desc", "creator-1");
    store.insert(&record).await.expect("Failed to insert");

    let loaded = store
        .get(&record.id)
        .await
        .expect("Failed to get")
        .expect("Record missing");
    assert_eq!(loaded.status, VideoStatus::Uploading);

    let processing = loaded.mark_processing().expect("transition");
    store
        .compare_and_update(&processing, VideoStatus::Uploading)
        .await
        .expect("CAS should succeed against UPLOADING");

    // Stale guard loses
    let stale = processing.clone();
    let err = store
        .compare_and_update(&stale, VideoStatus::Uploading)
        .await
        .expect_err("stale CAS must fail");
    assert!(matches!(err, StoreError::PreconditionFailed(_)));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_caption_batch_roundtrip() {
    dotenvy::dotenv().ok();

    let store = RedisStore::from_env().expect("Failed to create store");
    let video_id = VideoId::new();

    let segments = vec![
        CaptionSegment::new(video_id.clone(), "Second line", 2.0, 3.5, "en"),
        CaptionSegment::new(video_id.clone(), "First line", 0.0, 1.5, "en"),
    ];
    store
        .replace_by_video(&video_id, &segments)
        .await
        .expect("Failed to save");

    let loaded = store
        .get_by_video(&video_id)
        .await
        .expect("Failed to list");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].text, "First line");

    // Regeneration drops the old set, it does not append
    let regenerated = vec![CaptionSegment::new(video_id.clone(), "Only line", 0.0, 1.0, "en")];
    store
        .replace_by_video(&video_id, &regenerated)
        .await
        .expect("Failed to replace");
    let loaded = store.get_by_video(&video_id).await.expect("Failed to list");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "Only line");

    assert!(store
        .delete_by_video(&video_id)
        .await
        .expect("Failed to delete"));
    assert!(store.get_by_video(&video_id).await.unwrap().is_empty());
}
