// src/store/mod.rs
pub mod firebase;
pub mod memory;
pub mod redis_history;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::CampusRideError;
use crate::models::driver::DriverProfile;
use crate::models::history::RideHistoryRecord;
use crate::models::passenger::Passenger;
use crate::models::ride::{DriverSnapshot, Ride, RideRating, RideStatus};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use redis_history::RedisHistoryStore;

// Error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write unacknowledged after {0:?}")]
    Indeterminate(std::time::Duration),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("ride {0} already claimed")]
    ClaimConflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CampusRideError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(msg) => CampusRideError::RemoteUnavailable(msg),
            StoreError::Indeterminate(after) => {
                CampusRideError::WriteIndeterminate(format!("no acknowledgement after {after:?}"))
            }
            StoreError::NotFound(id) => CampusRideError::NotFound(id),
            StoreError::ClaimConflict(ride_id) => CampusRideError::ClaimConflict(ride_id),
            StoreError::Serialization(msg) => CampusRideError::InvalidFormat(msg),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Ride documents in the remote store.
///
/// No client owns a ride record; any number of devices read and write the
/// same document. The only write with a precondition is [`claim_ride`]:
/// implementations must make it conditional on the ride still being in
/// `searching` with no driver attached, and report a lost race as
/// [`StoreError::ClaimConflict`] rather than silently overwriting.
///
/// [`claim_ride`]: RideStore::claim_ride
#[async_trait]
pub trait RideStore: Send + Sync {
    async fn put_ride(&self, ride: &Ride) -> StoreResult<()>;
    async fn ride(&self, ride_id: &str) -> StoreResult<Option<Ride>>;
    async fn searching_rides(&self) -> StoreResult<Vec<Ride>>;
    async fn rides_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Ride>>;

    /// Live updates of the `searching` set, delivered as whole snapshots
    /// over a broadcast channel.
    async fn subscribe_searching(&self) -> StoreResult<broadcast::Receiver<Vec<Ride>>>;

    /// Conditional claim: attach the driver snapshot and move the ride to
    /// `driver_assigned`, failing with `ClaimConflict` if another driver
    /// got there first.
    async fn claim_ride(&self, ride_id: &str, snapshot: &DriverSnapshot) -> StoreResult<Ride>;

    /// Plain status write stamping `updated_at`. Transition validity is the
    /// caller's responsibility; the store does not enforce the graph.
    async fn update_status(
        &self,
        ride_id: &str,
        status: RideStatus,
        rejected_by: Option<&str>,
    ) -> StoreResult<Ride>;

    async fn put_rating(&self, rating: &RideRating) -> StoreResult<()>;
}

/// Passenger and driver profile documents.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn put_passenger(&self, passenger: &Passenger) -> StoreResult<()>;
    async fn passenger(&self, passenger_id: &str) -> StoreResult<Option<Passenger>>;
    async fn put_driver(&self, driver: &DriverProfile) -> StoreResult<()>;
    async fn driver(&self, driver_id: &str) -> StoreResult<Option<DriverProfile>>;
    async fn set_driver_online(&self, driver_id: &str, online: bool) -> StoreResult<DriverProfile>;

    /// Atomic balance adjustment; returns the new balance.
    async fn adjust_wallet(&self, passenger_id: &str, delta: f64) -> StoreResult<f64>;
}

/// Device-local mirror of ride lifecycle events (the unsynced queue).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, record: &RideHistoryRecord) -> StoreResult<()>;
    async fn mark_synced(&self, ride_id: &str) -> StoreResult<()>;
    async fn unsynced(&self) -> StoreResult<Vec<RideHistoryRecord>>;
    async fn by_ride_id(&self, ride_id: &str) -> StoreResult<Option<RideHistoryRecord>>;
}

/// Remote side of the mirror: an idempotent upsert keyed by ride id.
/// Split out so the sync worker depends on nothing else.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn upsert_history(&self, record: &RideHistoryRecord) -> StoreResult<()>;
}
