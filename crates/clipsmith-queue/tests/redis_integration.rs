//! Queue integration tests against a live Redis.

use clipsmith_models::VideoId;
use clipsmith_queue::{CaptionJob, JobQueue, QueueJob, TranscodeJob};

/// Test Redis connection and basic operations.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let len = queue.len().await.expect("Failed to get queue length");
    println!("Queue length: {}", len);
}

/// Test job enqueue and dequeue cycle.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_job_enqueue_dequeue() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let video_id = VideoId::new();
    let job = TranscodeJob::new(video_id.clone(), "it_clip.mov");
    let job_id = job.job_id.clone();

    let message_id = queue.enqueue_transcode(job).await.expect("Failed to enqueue");
    println!("Enqueued job {} with message ID {}", job_id, message_id);

    let jobs = queue
        .consume("test-consumer", 1000, 1)
        .await
        .expect("Failed to consume");

    assert_eq!(jobs.len(), 1);
    let (msg_id, consumed) = &jobs[0];
    assert_eq!(consumed.job_id(), &job_id);
    assert_eq!(consumed.video_id(), &video_id);

    queue.ack(msg_id).await.expect("Failed to ack");
    queue
        .clear_dedup(consumed)
        .await
        .expect("Failed to clear dedup");
}

/// A second submission for the same video is rejected while in flight.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_duplicate_submission_rejected() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let video_id = VideoId::new();
    queue
        .enqueue_caption(CaptionJob::new(video_id.clone()))
        .await
        .expect("Failed to enqueue");

    let dup = queue.enqueue_caption(CaptionJob::new(video_id.clone())).await;
    assert!(dup.is_err(), "duplicate caption job should be rejected");

    // Drain so reruns start clean
    let jobs = queue
        .consume("test-consumer", 1000, 10)
        .await
        .expect("Failed to consume");
    for (msg_id, job) in &jobs {
        queue.ack(msg_id).await.expect("Failed to ack");
        queue.clear_dedup(job).await.expect("Failed to clear dedup");
    }
}

/// Test DLQ functionality.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_dlq_roundtrip() {
    dotenvy::dotenv().ok();

    let queue = JobQueue::from_env().expect("Failed to create queue");
    queue.init().await.expect("Failed to initialize queue");

    let job = QueueJob::Transcode(TranscodeJob::new(VideoId::new(), "dlq_clip.mov"));
    let before = queue.dlq_len().await.expect("Failed to get DLQ length");

    queue
        .dlq("0-0", &job, "synthetic failure")
        .await
        .expect("Failed to dead-letter");

    let after = queue.dlq_len().await.expect("Failed to get DLQ length");
    assert!(after > before);
}
