// src/models/ride.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle states of a ride record.
///
/// The only valid walk is searching -> driver_assigned -> driver_arrived ->
/// picked_up -> completed -> rated, with searching -> rejected as the single
/// side exit. `rejected` and `rated` have no outgoing edges.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Searching,      // Ride created, visible to online drivers
    DriverAssigned, // A driver claimed the ride
    DriverArrived,  // Driver is at the pickup point
    PickedUp,       // Passenger on board
    Completed,      // Trip finished
    Rated,          // Passenger left a rating
    Rejected,       // A driver turned the request down
}

impl RideStatus {
    /// Single source of truth for the transition graph. Every caller must
    /// pass this check before issuing a status write.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Searching, DriverAssigned)
                | (Searching, Rejected)
                | (DriverAssigned, DriverArrived)
                | (DriverArrived, PickedUp)
                | (PickedUp, Completed)
                | (Completed, Rated)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Rated | RideStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Searching => "searching",
            RideStatus::DriverAssigned => "driver_assigned",
            RideStatus::DriverArrived => "driver_arrived",
            RideStatus::PickedUp => "picked_up",
            RideStatus::Completed => "completed",
            RideStatus::Rated => "rated",
            RideStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum VehicleClass {
    Standard,
    Premium,
    Group,
}

impl VehicleClass {
    /// Base fare in rand before the per-kilometer component.
    pub fn base_fare(self) -> f64 {
        match self {
            VehicleClass::Standard => 25.0,
            VehicleClass::Premium => 40.0,
            VehicleClass::Group => 60.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// A zero component marks an unset location; the map picker never
    /// produces (0, 0) for a real place.
    pub fn is_set(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

/// Copy of the driver profile taken at claim time. Deliberately not
/// live-linked: later profile edits do not touch rides already claimed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverSnapshot {
    pub driver_id: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_registration: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ride {
    pub id: String,
    pub passenger_id: String,
    pub passenger_name: String,
    pub passenger_email: String,

    // Geometry, immutable once the ride enters `searching`
    pub pickup_location: String,
    pub pickup_coordinates: Coordinates,
    pub dropoff_location: String,
    pub dropoff_coordinates: Coordinates,

    // Commercial fields, fixed at creation and never recomputed
    pub vehicle_class: VehicleClass,
    pub estimated_fare: f64,
    pub estimated_time_min: i64,
    pub distance_km: f64,

    pub status: RideStatus,
    pub driver: Option<DriverSnapshot>,
    pub rejected_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct RideRequest {
    pub passenger_id: String,
    pub passenger_name: String,
    pub passenger_email: String,
    pub pickup_location: String,
    pub pickup_coordinates: Coordinates,
    pub dropoff_location: String,
    pub dropoff_coordinates: Coordinates,
    pub vehicle_class: VehicleClass,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RideResponse {
    pub id: String,
    pub passenger_id: String,
    pub passenger_name: String,
    pub pickup_location: String,
    pub pickup_coordinates: Coordinates,
    pub dropoff_location: String,
    pub dropoff_coordinates: Coordinates,
    pub vehicle_class: VehicleClass,
    pub estimated_fare: f64,
    pub estimated_time_min: i64,
    pub distance_km: f64,
    pub status: RideStatus,
    pub driver: Option<DriverSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub driver_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejectRequest {
    pub driver_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub driver_id: String,
    pub status: RideStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingRequest {
    pub passenger_id: String,
    pub rating: f64,
    pub feedback: Option<String>,
}

/// Rating document, stored separately from the ride and keyed by ride id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RideRating {
    pub id: String,
    pub ride_id: String,
    pub driver_id: String,
    pub passenger_id: String,
    pub rating: f64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_valid() {
        use RideStatus::*;
        let path = [Searching, DriverAssigned, DriverArrived, PickedUp, Completed, Rated];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn rejection_only_leaves_searching() {
        use RideStatus::*;
        assert!(Searching.can_transition_to(Rejected));
        for status in [DriverAssigned, DriverArrived, PickedUp, Completed, Rated, Rejected] {
            assert!(!status.can_transition_to(Rejected));
        }
    }

    #[test]
    fn no_backward_or_skipping_transitions() {
        use RideStatus::*;
        assert!(!Completed.can_transition_to(DriverAssigned));
        assert!(!Searching.can_transition_to(DriverArrived));
        assert!(!Searching.can_transition_to(Completed));
        assert!(!DriverAssigned.can_transition_to(Completed));
        assert!(!PickedUp.can_transition_to(DriverArrived));
    }

    #[test]
    fn terminal_states_have_no_exit() {
        use RideStatus::*;
        let all = [Searching, DriverAssigned, DriverArrived, PickedUp, Completed, Rated, Rejected];
        for terminal in [Rated, Rejected] {
            assert!(terminal.is_terminal());
            for next in all {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(!Completed.is_terminal());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&RideStatus::DriverAssigned).unwrap();
        assert_eq!(json, "\"driver_assigned\"");
        let back: RideStatus = serde_json::from_str("\"picked_up\"").unwrap();
        assert_eq!(back, RideStatus::PickedUp);
    }

    #[test]
    fn zero_coordinates_are_unset() {
        assert!(!Coordinates::new(0.0, 28.03).is_set());
        assert!(!Coordinates::new(-26.19, 0.0).is_set());
        assert!(Coordinates::new(-26.19, 28.03).is_set());
    }
}
