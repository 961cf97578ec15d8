// src/store/firebase.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firebase_rs::Firebase;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::models::driver::DriverProfile;
use crate::models::history::RideHistoryRecord;
use crate::models::passenger::Passenger;
use crate::models::ride::{DriverSnapshot, Ride, RideRating, RideStatus};
use crate::store::{HistorySink, ProfileStore, RideStore, StoreError, StoreResult};

const SEARCHING_CHANNEL_CAPACITY: usize = 16;
const WALLET_CAS_ATTEMPTS: usize = 3;

/// Remote document store backed by the Firebase realtime database.
///
/// Ordinary reads and writes go through the `firebase-rs` client. The two
/// compare-and-swap writes (ride claim, wallet adjustment) talk to the REST
/// API directly with `reqwest`, because the client crate exposes no ETag
/// support: a GET with `X-Firebase-ETag: true` returns the node's ETag, and
/// a PUT with `if-match` fails with 412 when the node changed underneath.
///
/// Every write is bounded by `write_timeout`; expiry surfaces as
/// [`StoreError::Indeterminate`] because the write may or may not have
/// landed, and the caller must re-query rather than assume either outcome.
pub struct FirebaseStore {
    fb: Firebase,
    http: reqwest::Client,
    base_url: String,
    write_timeout: Duration,
    poll_interval: Duration,
    searching_tx: broadcast::Sender<Vec<Ride>>,
}

/// Partial ride update for status transitions; merged into the document
/// so the immutable fields are never rewritten.
#[derive(Debug, Serialize, Deserialize)]
struct StatusPatch {
    status: RideStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected_by: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OnlinePatch {
    online: bool,
    updated_at: DateTime<Utc>,
}

impl FirebaseStore {
    pub fn new(
        base_url: &str,
        write_timeout: Duration,
        poll_interval: Duration,
    ) -> StoreResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let fb = Firebase::new(&base_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid firebase url: {e}")))?;
        let (searching_tx, _) = broadcast::channel(SEARCHING_CHANNEL_CAPACITY);

        Ok(Self {
            fb,
            http: reqwest::Client::new(),
            base_url,
            write_timeout,
            poll_interval,
            searching_tx,
        })
    }

    fn node_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, collection, id)
    }

    /// Bound a write by the configured timeout. Expiry is indeterminate,
    /// not a failure: the request may still land on the server.
    async fn write_guard<T, E, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match tokio::time::timeout(self.write_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(StoreError::Unavailable(err.to_string())),
            Err(_) => Err(StoreError::Indeterminate(self.write_timeout)),
        }
    }

    /// Fetch a node together with its ETag for a conditional write.
    async fn fetch_with_etag<T>(&self, url: &str) -> StoreResult<(Option<T>, String)>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .header("X-Firebase-ETag", "true")
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Unavailable("store returned no etag".to_string()))?;

        let value: Option<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok((value, etag))
    }

    /// PUT guarded by `if-match`; a 412 means the node changed since the
    /// ETag was read.
    async fn conditional_put<T>(&self, url: &str, etag: &str, value: &T) -> StoreResult<bool>
    where
        T: Serialize,
    {
        let response = self
            .write_guard(
                self.http
                    .put(url)
                    .header(reqwest::header::IF_MATCH, etag)
                    .json(value)
                    .send(),
            )
            .await?;

        if response.status() == reqwest::StatusCode::PRECONDITION_FAILED {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "conditional write failed with status {}",
                response.status()
            )));
        }
        Ok(true)
    }

    /// Poll the `searching` set and publish snapshots to subscribers. The
    /// remote database pushes per-node events only; whole-query snapshots
    /// come from polling.
    pub fn spawn_watcher(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                match self.searching_rides().await {
                    Ok(rides) => {
                        let _ = self.searching_tx.send(rides);
                    }
                    Err(err) => {
                        tracing::warn!("searching poll failed: {err}");
                    }
                }
            }
        })
    }

    async fn all_rides(&self) -> StoreResult<Vec<Ride>> {
        let rides: Option<HashMap<String, Ride>> = self
            .fb
            .at("rides")
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(rides.map(|map| map.into_values().collect()).unwrap_or_default())
    }
}

#[async_trait]
impl RideStore for FirebaseStore {
    async fn put_ride(&self, ride: &Ride) -> StoreResult<()> {
        self.write_guard(self.fb.at("rides").at(&ride.id).set(ride)).await?;
        Ok(())
    }

    async fn ride(&self, ride_id: &str) -> StoreResult<Option<Ride>> {
        self.fb
            .at("rides")
            .at(ride_id)
            .get::<Option<Ride>>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn searching_rides(&self) -> StoreResult<Vec<Ride>> {
        let mut open: Vec<Ride> = self
            .all_rides()
            .await?
            .into_iter()
            .filter(|ride| ride.status == RideStatus::Searching)
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }

    async fn rides_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Ride>> {
        Ok(self
            .all_rides()
            .await?
            .into_iter()
            .filter(|ride| ride.passenger_id == passenger_id)
            .collect())
    }

    async fn subscribe_searching(&self) -> StoreResult<broadcast::Receiver<Vec<Ride>>> {
        Ok(self.searching_tx.subscribe())
    }

    async fn claim_ride(&self, ride_id: &str, snapshot: &DriverSnapshot) -> StoreResult<Ride> {
        let url = self.node_url("rides", ride_id);
        let (ride, etag) = self.fetch_with_etag::<Ride>(&url).await?;
        let mut ride = ride.ok_or_else(|| StoreError::NotFound(ride_id.to_string()))?;

        if ride.status != RideStatus::Searching || ride.driver.is_some() {
            return Err(StoreError::ClaimConflict(ride_id.to_string()));
        }

        ride.driver = Some(snapshot.clone());
        ride.status = RideStatus::DriverAssigned;
        ride.updated_at = Utc::now();

        // A 412 here is the race itself: someone else wrote the node after
        // our ETag read, so the claim is lost, not retried.
        if !self.conditional_put(&url, &etag, &ride).await? {
            return Err(StoreError::ClaimConflict(ride_id.to_string()));
        }
        Ok(ride)
    }

    async fn update_status(
        &self,
        ride_id: &str,
        status: RideStatus,
        rejected_by: Option<&str>,
    ) -> StoreResult<Ride> {
        let mut ride = self
            .ride(ride_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(ride_id.to_string()))?;

        let patch = StatusPatch {
            status,
            rejected_by: rejected_by.map(str::to_string),
            updated_at: Utc::now(),
        };
        self.write_guard(self.fb.at("rides").at(ride_id).update(&patch)).await?;

        ride.status = patch.status;
        if patch.rejected_by.is_some() {
            ride.rejected_by = patch.rejected_by;
        }
        ride.updated_at = patch.updated_at;
        Ok(ride)
    }

    async fn put_rating(&self, rating: &RideRating) -> StoreResult<()> {
        self.write_guard(self.fb.at("rideRatings").at(&rating.ride_id).set(rating))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FirebaseStore {
    async fn put_passenger(&self, passenger: &Passenger) -> StoreResult<()> {
        self.write_guard(self.fb.at("passengers").at(&passenger.id).set(passenger))
            .await?;
        Ok(())
    }

    async fn passenger(&self, passenger_id: &str) -> StoreResult<Option<Passenger>> {
        self.fb
            .at("passengers")
            .at(passenger_id)
            .get::<Option<Passenger>>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn put_driver(&self, driver: &DriverProfile) -> StoreResult<()> {
        self.write_guard(self.fb.at("drivers").at(&driver.id).set(driver)).await?;
        Ok(())
    }

    async fn driver(&self, driver_id: &str) -> StoreResult<Option<DriverProfile>> {
        self.fb
            .at("drivers")
            .at(driver_id)
            .get::<Option<DriverProfile>>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn set_driver_online(&self, driver_id: &str, online: bool) -> StoreResult<DriverProfile> {
        let mut driver = self
            .driver(driver_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(driver_id.to_string()))?;

        let patch = OnlinePatch { online, updated_at: Utc::now() };
        self.write_guard(self.fb.at("drivers").at(driver_id).update(&patch)).await?;

        driver.online = online;
        driver.updated_at = patch.updated_at;
        Ok(driver)
    }

    async fn adjust_wallet(&self, passenger_id: &str, delta: f64) -> StoreResult<f64> {
        let url = self.node_url("passengers", passenger_id);

        for _ in 0..WALLET_CAS_ATTEMPTS {
            let (passenger, etag) = self.fetch_with_etag::<Passenger>(&url).await?;
            let mut passenger =
                passenger.ok_or_else(|| StoreError::NotFound(passenger_id.to_string()))?;

            passenger.wallet_balance += delta;
            passenger.updated_at = Utc::now();

            if self.conditional_put(&url, &etag, &passenger).await? {
                return Ok(passenger.wallet_balance);
            }
            // Lost the CAS to a concurrent balance write; re-read and retry.
        }

        Err(StoreError::Unavailable(format!(
            "wallet update for {passenger_id} kept losing the compare-and-swap"
        )))
    }
}

#[async_trait]
impl HistorySink for FirebaseStore {
    async fn upsert_history(&self, record: &RideHistoryRecord) -> StoreResult<()> {
        // Keyed by ride id, so re-sending after a failed pass overwrites
        // the same node instead of duplicating it.
        self.write_guard(self.fb.at("rideHistory").at(&record.ride_id).set(record))
            .await?;
        Ok(())
    }
}
