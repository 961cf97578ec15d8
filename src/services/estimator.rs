// src/services/estimator.rs
use serde::{Deserialize, Serialize};

use crate::models::ride::{Coordinates, VehicleClass};

/// Earth's radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Per-kilometer rate in rand, on top of the vehicle-class base fare.
pub const PER_KM_RATE: f64 = 5.0;

/// Kilometers covered per minute at the assumed 30 km/h average speed.
const KM_PER_MINUTE: f64 = 0.5;

pub const MIN_ETA_MIN: i64 = 3;
pub const MAX_ETA_MIN: i64 = 120;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FareEstimate {
    pub fare: f64,
    pub time_min: i64,
    pub distance_km: f64,
}

impl FareEstimate {
    /// The "no estimate" result for unset locations.
    pub fn none() -> Self {
        Self { fare: 0.0, time_min: 0, distance_km: 0.0 }
    }
}

/// Great-circle distance between two coordinate pairs via the haversine
/// formula.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// ETA in minutes: rounded minutes at average speed, clamped to
/// [MIN_ETA_MIN, MAX_ETA_MIN].
pub fn eta_minutes(distance_km: f64) -> i64 {
    ((distance_km / KM_PER_MINUTE).round() as i64).clamp(MIN_ETA_MIN, MAX_ETA_MIN)
}

/// Deterministic fare/ETA estimate. Fixed at ride creation; never
/// recomputed afterwards. Either location being unset short-circuits to a
/// zero estimate instead of pricing a degenerate trip.
pub fn estimate(pickup: Coordinates, dropoff: Coordinates, class: VehicleClass) -> FareEstimate {
    if !pickup.is_set() || !dropoff.is_set() {
        return FareEstimate::none();
    }

    let distance_km = haversine_km(pickup, dropoff);
    FareEstimate {
        fare: class.base_fare() + distance_km * PER_KM_RATE,
        time_min: eta_minutes(distance_km),
        distance_km,
    }
}
