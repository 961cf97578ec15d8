// src/store/redis_history.rs
use async_trait::async_trait;
use redis::AsyncCommands;

use crate::models::history::RideHistoryRecord;
use crate::store::{HistoryStore, StoreError, StoreResult};

const RECORD_PREFIX: &str = "history:ride:";
const UNSYNCED_SET: &str = "history:unsynced";

/// Device-local history mirror on redis: one JSON value per record plus a
/// set of unsynced ride ids so the sync worker never scans the whole
/// keyspace.
pub struct RedisHistoryStore {
    client: redis::Client,
}

impl RedisHistoryStore {
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    fn record_key(ride_id: &str) -> String {
        format!("{RECORD_PREFIX}{ride_id}")
    }

    async fn connection(&self) -> StoreResult<redis::aio::Connection> {
        Ok(self.client.get_async_connection().await?)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn insert(&self, record: &RideHistoryRecord) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(record)?;
        let key = Self::record_key(&record.ride_id);

        let _: () = conn.set(&key, &json).await?;
        if record.synced {
            let _: () = conn.srem(UNSYNCED_SET, &record.ride_id).await?;
        } else {
            let _: () = conn.sadd(UNSYNCED_SET, &record.ride_id).await?;
        }
        Ok(())
    }

    async fn mark_synced(&self, ride_id: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let key = Self::record_key(ride_id);

        let json: Option<String> = conn.get(&key).await?;
        let mut record: RideHistoryRecord = match json {
            Some(json) => serde_json::from_str(&json)?,
            None => return Err(StoreError::NotFound(ride_id.to_string())),
        };

        record.synced = true;
        let json = serde_json::to_string(&record)?;
        let _: () = conn.set(&key, &json).await?;
        let _: () = conn.srem(UNSYNCED_SET, ride_id).await?;
        Ok(())
    }

    async fn unsynced(&self) -> StoreResult<Vec<RideHistoryRecord>> {
        let mut conn = self.connection().await?;
        let ride_ids: Vec<String> = conn.smembers(UNSYNCED_SET).await?;

        let mut pending = Vec::with_capacity(ride_ids.len());
        for ride_id in ride_ids {
            let json: Option<String> = conn.get(Self::record_key(&ride_id)).await?;
            // An id in the set without a record means a torn insert; skip
            // it rather than failing the whole scan.
            if let Some(json) = json {
                pending.push(serde_json::from_str(&json)?);
            }
        }
        pending.sort_by(|a: &RideHistoryRecord, b: &RideHistoryRecord| {
            a.recorded_at.cmp(&b.recorded_at)
        });
        Ok(pending)
    }

    async fn by_ride_id(&self, ride_id: &str) -> StoreResult<Option<RideHistoryRecord>> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(Self::record_key(ride_id)).await?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
