// src/models/history.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::ride::{Ride, RideStatus};

/// Denormalized mirror of a ride lifecycle event, kept on the device that
/// produced it. `synced` flips to true once the record has been delivered
/// to the remote store; records are never deleted here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RideHistoryRecord {
    pub ride_id: String,
    pub passenger_id: String,
    pub driver_id: Option<String>,
    pub status: RideStatus,
    pub origin: String,
    pub destination: String,
    pub fare: f64,
    pub distance_km: f64,
    pub recorded_at: DateTime<Utc>,
    pub synced: bool,
}

impl RideHistoryRecord {
    /// Snapshot the ride as an unsynced local record. On a rejection the
    /// ride carries no driver snapshot, so the rejecting driver is taken
    /// from `rejected_by` instead.
    pub fn from_ride(ride: &Ride) -> Self {
        let driver_id = ride
            .driver
            .as_ref()
            .map(|d| d.driver_id.clone())
            .or_else(|| ride.rejected_by.clone());

        Self {
            ride_id: ride.id.clone(),
            passenger_id: ride.passenger_id.clone(),
            driver_id,
            status: ride.status,
            origin: ride.pickup_location.clone(),
            destination: ride.dropoff_location.clone(),
            fare: ride.estimated_fare,
            distance_km: ride.distance_km,
            recorded_at: Utc::now(),
            synced: false,
        }
    }
}
