//! Work queue client over Redis Streams.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::{CaptionJob, QueueJob, TranscodeJob};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Max retries before DLQ
    pub max_retries: u32,
    /// How long a claimed delivery may sit before another consumer takes it
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "clipsmith:jobs".to_string(),
            consumer_group: "clipsmith:workers".to_string(),
            dlq_stream_name: "clipsmith:dlq".to_string(),
            max_retries: 3,
            visibility_timeout: Duration::from_secs(600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "clipsmith:jobs".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "clipsmith:workers".to_string()),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM")
                .unwrap_or_else(|_| "clipsmith:dlq".to_string()),
            max_retries: std::env::var("QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            visibility_timeout: Duration::from_secs(
                std::env::var("QUEUE_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// Work queue client.
///
/// Constructed once at process startup and shared by Arc; there is no
/// module-level connection state.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue client.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create the consumer group if needed).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a transcode job.
    pub async fn enqueue_transcode(&self, job: TranscodeJob) -> QueueResult<String> {
        self.enqueue(QueueJob::Transcode(job)).await
    }

    /// Enqueue a caption job.
    pub async fn enqueue_caption(&self, job: CaptionJob) -> QueueResult<String> {
        self.enqueue(QueueJob::Caption(job)).await
    }

    /// Enqueue a job.
    async fn enqueue(&self, job: QueueJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(&job)?;
        let idempotency_key = job.idempotency_key();

        // Reject a duplicate submission while an identical job is in flight
        let dedup_key = format!("clipsmith:dedup:{}", idempotency_key);
        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            warn!("Duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await?;

        conn.set_ex::<_, _, ()>(&dedup_key, "1", 3600).await?;

        info!(
            "Enqueued {} job {} with message ID {}",
            job.kind(),
            job.job_id(),
            message_id
        );

        Ok(message_id)
    }

    /// Clear the dedup key so the same logical job may be submitted again.
    pub async fn clear_dedup(&self, job: &QueueJob) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("clipsmith:dedup:{}", job.idempotency_key());
        conn.del::<_, ()>(&dedup_key).await?;
        Ok(())
    }

    /// Acknowledge a delivery (mark as completed).
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged delivery: {}", message_id);
        Ok(())
    }

    /// Move a job to the dead letter stream.
    pub async fn dlq(&self, message_id: &str, job: &QueueJob, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;

        warn!("Moved job {} to DLQ: {}", job.job_id(), error);
        Ok(())
    }

    /// Number of jobs on the stream.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Number of dead-lettered jobs.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    /// Consume new jobs for this consumer.
    /// Returns `(message_id, job)` pairs.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">") // Only new messages
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();
        for stream_key in result.keys {
            for entry in stream_key.ids {
                if let Some(job) = self.parse_entry(&entry.id, entry.map.get("job")).await {
                    jobs.push((entry.id.clone(), job));
                }
            }
        }

        Ok(jobs)
    }

    /// Claim pending deliveries idle longer than `min_idle_ms`.
    /// This recovers jobs from crashed workers.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let pending: redis::streams::StreamPendingReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .query_async(&mut conn)
            .await?;

        if pending.count() == 0 {
            return Ok(Vec::new());
        }

        let result: redis::streams::StreamClaimReply = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();
        for entry in result.ids {
            if let Some(job) = self.parse_entry(&entry.id, entry.map.get("job")).await {
                info!("Claimed pending job {} from stream", job.job_id());
                jobs.push((entry.id.clone(), job));
            }
        }

        Ok(jobs)
    }

    /// Parse a stream entry payload; malformed entries are acked so they do
    /// not loop through redelivery forever.
    async fn parse_entry(&self, message_id: &str, value: Option<&redis::Value>) -> Option<QueueJob> {
        let Some(redis::Value::BulkString(payload)) = value else {
            return None;
        };
        let payload_str = String::from_utf8_lossy(payload);
        match serde_json::from_str::<QueueJob>(&payload_str) {
            Ok(job) => {
                debug!("Consumed job {} from stream", job.job_id());
                Some(job)
            }
            Err(e) => {
                warn!("Failed to parse job payload: {}", e);
                self.ack(message_id).await.ok();
                None
            }
        }
    }

    /// Retry count recorded for a delivery.
    pub async fn get_retry_count(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("clipsmith:retry:{}", message_id);
        let count: Option<u32> = conn.get(&key).await?;
        Ok(count.unwrap_or(0))
    }

    /// Increment the retry count for a delivery.
    pub async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("clipsmith:retry:{}", message_id);
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, 86400).await?;
        Ok(count)
    }

    /// Max retries from config.
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Visibility timeout from config.
    pub fn visibility_timeout(&self) -> Duration {
        self.config.visibility_timeout
    }
}
