//! Redis-backed record and caption stores.
//!
//! Records live as JSON documents under `clipsmith:video:{id}`; the guarded
//! status transition runs as a Lua script so read-check-write is one atomic
//! server-side step. Captions live as a list under
//! `clipsmith:captions:{video_id}`.

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use tracing::debug;

use clipsmith_models::{CaptionSegment, VideoId, VideoRecord, VideoStatus};

use crate::error::{StoreError, StoreResult};
use crate::{CaptionStore, VideoStore};

const CAS_SCRIPT: &str = r#"
local cur = redis.call('GET', KEYS[1])
if not cur then
  return 'missing'
end
local status = cjson.decode(cur)['status']
if status ~= ARGV[1] then
  return status
end
redis.call('SET', KEYS[1], ARGV[2])
return 'ok'
"#;

/// Redis-backed implementation of both stores.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a new store.
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&url)
    }

    fn video_key(id: &VideoId) -> String {
        format!("clipsmith:video:{}", id)
    }

    fn caption_key(video_id: &VideoId) -> String {
        format!("clipsmith:captions:{}", video_id)
    }
}

#[async_trait]
impl VideoStore for RedisStore {
    async fn get(&self, id: &VideoId) -> StoreResult<Option<VideoRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::video_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::video_key(&record.id);
        let json = serde_json::to_string(record)?;

        let created: bool = redis::cmd("SET")
            .arg(&key)
            .arg(&json)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if !created {
            return Err(StoreError::already_exists(record.id.to_string()));
        }

        debug!(video_id = %record.id, "Inserted video record");
        Ok(())
    }

    async fn compare_and_update(
        &self,
        record: &VideoRecord,
        expected: VideoStatus,
    ) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(record)?;

        let outcome: String = Script::new(CAS_SCRIPT)
            .key(Self::video_key(&record.id))
            .arg(expected.as_str())
            .arg(&json)
            .invoke_async(&mut conn)
            .await?;

        match outcome.as_str() {
            "ok" => Ok(()),
            "missing" => Err(StoreError::not_found(record.id.to_string())),
            current => Err(StoreError::precondition_failed(format!(
                "video {} is {}, expected {}",
                record.id, current, expected
            ))),
        }
    }
}

#[async_trait]
impl CaptionStore for RedisStore {
    async fn replace_by_video(
        &self,
        video_id: &VideoId,
        segments: &[CaptionSegment],
    ) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::caption_key(video_id);

        // Serialize up front so a bad segment cannot abort mid-write
        let payloads = segments
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        // MULTI/EXEC: the old set and the full new batch swap in one step
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(&key).ignore();
        for payload in &payloads {
            pipe.rpush(&key, payload).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;

        debug!(video_id = %video_id, count = segments.len(), "Replaced caption set");
        Ok(())
    }

    async fn get_by_video(&self, video_id: &VideoId) -> StoreResult<Vec<CaptionSegment>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(Self::caption_key(video_id), 0, -1).await?;

        let mut segments = raw
            .iter()
            .map(|json| serde_json::from_str::<CaptionSegment>(json))
            .collect::<Result<Vec<_>, _>>()?;
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Ok(segments)
    }

    async fn delete_by_video(&self, video_id: &VideoId) -> StoreResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: u64 = conn.del(Self::caption_key(video_id)).await?;
        Ok(removed > 0)
    }
}
