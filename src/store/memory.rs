// src/store/memory.rs
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

use crate::models::driver::DriverProfile;
use crate::models::history::RideHistoryRecord;
use crate::models::passenger::Passenger;
use crate::models::ride::{DriverSnapshot, Ride, RideRating, RideStatus};
use crate::store::{HistorySink, HistoryStore, ProfileStore, RideStore, StoreError, StoreResult};

const SEARCHING_CHANNEL_CAPACITY: usize = 16;

/// In-memory store for tests and keyless development runs. Implements all
/// four store traits; the claim precondition is checked under the same
/// write lock as the mutation, so claims are genuinely atomic here.
pub struct MemoryStore {
    rides: RwLock<HashMap<String, Ride>>,
    ratings: RwLock<HashMap<String, RideRating>>,
    passengers: RwLock<HashMap<String, Passenger>>,
    drivers: RwLock<HashMap<String, DriverProfile>>,
    history: RwLock<HashMap<String, RideHistoryRecord>>,
    mirrored: RwLock<HashMap<String, RideHistoryRecord>>,
    searching_tx: broadcast::Sender<Vec<Ride>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (searching_tx, _) = broadcast::channel(SEARCHING_CHANNEL_CAPACITY);
        Self {
            rides: RwLock::new(HashMap::new()),
            ratings: RwLock::new(HashMap::new()),
            passengers: RwLock::new(HashMap::new()),
            drivers: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            mirrored: RwLock::new(HashMap::new()),
            searching_tx,
        }
    }

    fn searching_snapshot(rides: &HashMap<String, Ride>) -> Vec<Ride> {
        let mut open: Vec<Ride> = rides
            .values()
            .filter(|ride| ride.status == RideStatus::Searching)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        open
    }

    fn publish_searching(&self, rides: &HashMap<String, Ride>) {
        // No receivers is fine; the send result only says whether anyone
        // is listening right now.
        let _ = self.searching_tx.send(Self::searching_snapshot(rides));
    }

    /// Number of remote-mirrored history records, used by sync tests.
    pub async fn mirrored_count(&self) -> usize {
        self.mirrored.read().await.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn put_ride(&self, ride: &Ride) -> StoreResult<()> {
        let mut rides = self.rides.write().await;
        rides.insert(ride.id.clone(), ride.clone());
        self.publish_searching(&rides);
        Ok(())
    }

    async fn ride(&self, ride_id: &str) -> StoreResult<Option<Ride>> {
        Ok(self.rides.read().await.get(ride_id).cloned())
    }

    async fn searching_rides(&self) -> StoreResult<Vec<Ride>> {
        Ok(Self::searching_snapshot(&*self.rides.read().await))
    }

    async fn rides_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Ride>> {
        Ok(self
            .rides
            .read()
            .await
            .values()
            .filter(|ride| ride.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    async fn subscribe_searching(&self) -> StoreResult<broadcast::Receiver<Vec<Ride>>> {
        Ok(self.searching_tx.subscribe())
    }

    async fn claim_ride(&self, ride_id: &str, snapshot: &DriverSnapshot) -> StoreResult<Ride> {
        let mut rides = self.rides.write().await;
        let ride = rides
            .get_mut(ride_id)
            .ok_or_else(|| StoreError::NotFound(ride_id.to_string()))?;

        if ride.status != RideStatus::Searching || ride.driver.is_some() {
            return Err(StoreError::ClaimConflict(ride_id.to_string()));
        }

        ride.driver = Some(snapshot.clone());
        ride.status = RideStatus::DriverAssigned;
        ride.updated_at = Utc::now();
        let claimed = ride.clone();
        self.publish_searching(&rides);
        Ok(claimed)
    }

    async fn update_status(
        &self,
        ride_id: &str,
        status: RideStatus,
        rejected_by: Option<&str>,
    ) -> StoreResult<Ride> {
        let mut rides = self.rides.write().await;
        let ride = rides
            .get_mut(ride_id)
            .ok_or_else(|| StoreError::NotFound(ride_id.to_string()))?;

        ride.status = status;
        if let Some(driver_id) = rejected_by {
            ride.rejected_by = Some(driver_id.to_string());
        }
        ride.updated_at = Utc::now();
        let updated = ride.clone();
        self.publish_searching(&rides);
        Ok(updated)
    }

    async fn put_rating(&self, rating: &RideRating) -> StoreResult<()> {
        self.ratings
            .write()
            .await
            .insert(rating.ride_id.clone(), rating.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn put_passenger(&self, passenger: &Passenger) -> StoreResult<()> {
        self.passengers
            .write()
            .await
            .insert(passenger.id.clone(), passenger.clone());
        Ok(())
    }

    async fn passenger(&self, passenger_id: &str) -> StoreResult<Option<Passenger>> {
        Ok(self.passengers.read().await.get(passenger_id).cloned())
    }

    async fn put_driver(&self, driver: &DriverProfile) -> StoreResult<()> {
        self.drivers
            .write()
            .await
            .insert(driver.id.clone(), driver.clone());
        Ok(())
    }

    async fn driver(&self, driver_id: &str) -> StoreResult<Option<DriverProfile>> {
        Ok(self.drivers.read().await.get(driver_id).cloned())
    }

    async fn set_driver_online(&self, driver_id: &str, online: bool) -> StoreResult<DriverProfile> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(driver_id)
            .ok_or_else(|| StoreError::NotFound(driver_id.to_string()))?;
        driver.online = online;
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn adjust_wallet(&self, passenger_id: &str, delta: f64) -> StoreResult<f64> {
        let mut passengers = self.passengers.write().await;
        let passenger = passengers
            .get_mut(passenger_id)
            .ok_or_else(|| StoreError::NotFound(passenger_id.to_string()))?;
        passenger.wallet_balance += delta;
        passenger.updated_at = Utc::now();
        Ok(passenger.wallet_balance)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert(&self, record: &RideHistoryRecord) -> StoreResult<()> {
        self.history
            .write()
            .await
            .insert(record.ride_id.clone(), record.clone());
        Ok(())
    }

    async fn mark_synced(&self, ride_id: &str) -> StoreResult<()> {
        let mut history = self.history.write().await;
        let record = history
            .get_mut(ride_id)
            .ok_or_else(|| StoreError::NotFound(ride_id.to_string()))?;
        record.synced = true;
        Ok(())
    }

    async fn unsynced(&self) -> StoreResult<Vec<RideHistoryRecord>> {
        let mut pending: Vec<RideHistoryRecord> = self
            .history
            .read()
            .await
            .values()
            .filter(|record| !record.synced)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(pending)
    }

    async fn by_ride_id(&self, ride_id: &str) -> StoreResult<Option<RideHistoryRecord>> {
        Ok(self.history.read().await.get(ride_id).cloned())
    }
}

#[async_trait]
impl HistorySink for MemoryStore {
    async fn upsert_history(&self, record: &RideHistoryRecord) -> StoreResult<()> {
        self.mirrored
            .write()
            .await
            .insert(record.ride_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ride::{Coordinates, VehicleClass};

    fn sample_ride(id: &str) -> Ride {
        Ride {
            id: id.to_string(),
            passenger_id: "psg-1".to_string(),
            passenger_name: "Thandi M".to_string(),
            passenger_email: "thandi@uj.ac.za".to_string(),
            pickup_location: "Main Campus Gate".to_string(),
            pickup_coordinates: Coordinates::new(-26.1908, 28.0307),
            dropoff_location: "Student Center".to_string(),
            dropoff_coordinates: Coordinates::new(-26.1915, 28.0312),
            vehicle_class: VehicleClass::Standard,
            estimated_fare: 25.47,
            estimated_time_min: 3,
            distance_km: 0.09,
            status: RideStatus::Searching,
            driver: None,
            rejected_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_snapshot(driver_id: &str) -> DriverSnapshot {
        DriverSnapshot {
            driver_id: driver_id.to_string(),
            driver_name: "Sipho K".to_string(),
            driver_phone: "+27821234567".to_string(),
            vehicle_model: "Toyota Etios".to_string(),
            vehicle_color: "White".to_string(),
            vehicle_registration: "GP 123-456".to_string(),
        }
    }

    #[tokio::test]
    async fn ride_round_trip_preserves_fields() {
        let store = MemoryStore::new();
        let ride = sample_ride("ride-1");
        store.put_ride(&ride).await.unwrap();

        let loaded = store.ride("ride-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, ride.id);
        assert_eq!(loaded.passenger_id, ride.passenger_id);
        assert_eq!(loaded.pickup_location, ride.pickup_location);
        assert_eq!(loaded.pickup_coordinates, ride.pickup_coordinates);
        assert_eq!(loaded.dropoff_coordinates, ride.dropoff_coordinates);
        assert_eq!(loaded.vehicle_class, ride.vehicle_class);
        assert_eq!(loaded.estimated_fare, ride.estimated_fare);
        assert_eq!(loaded.estimated_time_min, ride.estimated_time_min);
        assert_eq!(loaded.distance_km, ride.distance_km);
        assert_eq!(loaded.created_at, ride.created_at);
    }

    #[tokio::test]
    async fn second_claim_conflicts() {
        let store = MemoryStore::new();
        store.put_ride(&sample_ride("ride-1")).await.unwrap();

        let first = store.claim_ride("ride-1", &sample_snapshot("drv-a")).await;
        let second = store.claim_ride("ride-1", &sample_snapshot("drv-b")).await;

        let claimed = first.unwrap();
        assert_eq!(claimed.status, RideStatus::DriverAssigned);
        assert_eq!(claimed.driver.unwrap().driver_id, "drv-a");
        assert!(matches!(second, Err(StoreError::ClaimConflict(_))));

        // The winning snapshot is untouched by the losing attempt.
        let stored = store.ride("ride-1").await.unwrap().unwrap();
        assert_eq!(stored.driver.unwrap().driver_id, "drv-a");
    }

    #[tokio::test]
    async fn searching_set_is_newest_first_and_shrinks_on_claim() {
        let store = MemoryStore::new();
        let mut older = sample_ride("ride-old");
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        store.put_ride(&older).await.unwrap();
        store.put_ride(&sample_ride("ride-new")).await.unwrap();

        let open = store.searching_rides().await.unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, "ride-new");

        store.claim_ride("ride-new", &sample_snapshot("drv-a")).await.unwrap();
        let open = store.searching_rides().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "ride-old");
    }

    #[tokio::test]
    async fn subscription_receives_searching_updates() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_searching().await.unwrap();

        store.put_ride(&sample_ride("ride-1")).await.unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        store.claim_ride("ride-1", &sample_snapshot("drv-a")).await.unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert!(snapshot.is_empty());
    }
}
