// src/services/ride_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing;
use uuid::Uuid;

use crate::{
    ValidationError,
    errors::CampusRideError as AppError,
    models::ride::{
        RatingRequest, Ride, RideRating, RideRequest, RideResponse, RideStatus,
    },
    services::{
        estimator,
        notification_service::NotificationService,
        sync_service::HistoryService,
    },
    store::{ProfileStore, RideStore, StoreError},
    utils::id_generator::{IdGenerator, IdType, WithGeneratedId},
};

#[async_trait]
pub trait RideOperations: Send + Sync {
    async fn request_ride(&self, request: RideRequest) -> Result<RideResponse, AppError>;
    async fn get_ride(&self, ride_id: &str) -> Result<Option<RideResponse>, AppError>;
    async fn open_requests(&self) -> Result<Vec<RideResponse>, AppError>;
    async fn rides_for_passenger(&self, passenger_id: &str) -> Result<Vec<RideResponse>, AppError>;
    async fn claim_ride(&self, ride_id: &str, driver_id: &str) -> Result<RideResponse, AppError>;
    async fn reject_ride(&self, ride_id: &str, driver_id: &str) -> Result<RideResponse, AppError>;
    async fn advance_ride(&self, ride_id: &str, driver_id: &str, next: RideStatus) -> Result<RideResponse, AppError>;
    async fn rate_ride(&self, ride_id: &str, request: RatingRequest) -> Result<RideResponse, AppError>;
}

pub struct RideService {
    rides: Arc<dyn RideStore>,
    profiles: Arc<dyn ProfileStore>,
    history: Arc<HistoryService>,
    notification_service: Arc<dyn NotificationService>,
}

impl RideService {
    pub fn new(
        rides: Arc<dyn RideStore>,
        profiles: Arc<dyn ProfileStore>,
        history: Arc<HistoryService>,
        notification_service: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            rides,
            profiles,
            history,
            notification_service,
        }
    }

    fn to_response(&self, ride: Ride) -> RideResponse {
        RideResponse {
            id: ride.id,
            passenger_id: ride.passenger_id,
            passenger_name: ride.passenger_name,
            pickup_location: ride.pickup_location,
            pickup_coordinates: ride.pickup_coordinates,
            dropoff_location: ride.dropoff_location,
            dropoff_coordinates: ride.dropoff_coordinates,
            vehicle_class: ride.vehicle_class,
            estimated_fare: ride.estimated_fare,
            estimated_time_min: ride.estimated_time_min,
            distance_km: ride.distance_km,
            status: ride.status,
            driver: ride.driver,
            created_at: ride.created_at,
            updated_at: ride.updated_at,
        }
    }

    async fn load_ride(&self, ride_id: &str) -> Result<Ride, AppError> {
        self.rides
            .ride(ride_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::ride_not_found(ride_id))
    }

    fn validate_request(request: &RideRequest) -> Result<(), AppError> {
        let mut errors = Vec::new();

        if request.pickup_location.trim().is_empty() {
            errors.push(ValidationError {
                field: "pickup_location".to_string(),
                message: "Pickup location is required".to_string(),
            });
        }
        if request.dropoff_location.trim().is_empty() {
            errors.push(ValidationError {
                field: "dropoff_location".to_string(),
                message: "Dropoff location is required".to_string(),
            });
        }
        if !request.pickup_location.trim().is_empty()
            && request.pickup_location == request.dropoff_location
        {
            errors.push(ValidationError {
                field: "dropoff_location".to_string(),
                message: "Pickup and dropoff locations cannot be the same".to_string(),
            });
        }
        if !request.pickup_coordinates.is_set() {
            errors.push(ValidationError {
                field: "pickup_coordinates".to_string(),
                message: "Pickup coordinates are not set".to_string(),
            });
        }
        if !request.dropoff_coordinates.is_set() {
            errors.push(ValidationError {
                field: "dropoff_coordinates".to_string(),
                message: "Dropoff coordinates are not set".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(errors))
        }
    }
}

#[async_trait]
impl RideOperations for RideService {
    async fn request_ride(&self, request: RideRequest) -> Result<RideResponse, AppError> {
        tracing::info!("Creating ride for passenger: {}", request.passenger_id);

        Self::validate_request(&request)?;

        let estimate = estimator::estimate(
            request.pickup_coordinates,
            request.dropoff_coordinates,
            request.vehicle_class,
        );
        if estimate.fare <= 0.0 {
            return Err(AppError::validation_error(
                "estimated_fare",
                "Locations do not produce a positive fare",
            ));
        }

        if self.profiles.passenger(&request.passenger_id).await?.is_none() {
            return Err(AppError::passenger_not_found(&request.passenger_id));
        }

        let now = Utc::now();
        let ride = Ride {
            id: String::new(), // Will be set by with_generated_id
            passenger_id: request.passenger_id,
            passenger_name: request.passenger_name,
            passenger_email: request.passenger_email,
            pickup_location: request.pickup_location,
            pickup_coordinates: request.pickup_coordinates,
            dropoff_location: request.dropoff_location,
            dropoff_coordinates: request.dropoff_coordinates,
            vehicle_class: request.vehicle_class,
            estimated_fare: estimate.fare,
            estimated_time_min: estimate.time_min,
            distance_km: estimate.distance_km,
            status: RideStatus::Searching,
            driver: None,
            rejected_by: None,
            created_at: now,
            updated_at: now,
        }
        .with_generated_id(IdType::Ride);

        self.rides.put_ride(&ride).await?;

        tracing::info!("Ride created: {} - R{:.2}", ride.id, ride.estimated_fare);

        Ok(self.to_response(ride))
    }

    async fn get_ride(&self, ride_id: &str) -> Result<Option<RideResponse>, AppError> {
        // Validate ID format first
        if !IdGenerator::validate_id(ride_id, Some(IdType::Ride)) {
            tracing::warn!("Invalid ride ID format: {}", ride_id);
            return Ok(None);
        }

        tracing::debug!("Getting ride: {}", ride_id);
        Ok(self.rides.ride(ride_id).await?.map(|ride| self.to_response(ride)))
    }

    async fn open_requests(&self) -> Result<Vec<RideResponse>, AppError> {
        tracing::debug!("Listing open ride requests");

        let open = self.rides.searching_rides().await?;
        Ok(open.into_iter().map(|ride| self.to_response(ride)).collect())
    }

    async fn rides_for_passenger(&self, passenger_id: &str) -> Result<Vec<RideResponse>, AppError> {
        tracing::debug!("Getting ride history for passenger: {}", passenger_id);

        let mut rides = self.rides.rides_for_passenger(passenger_id).await?;

        // Sort by creation date (newest first)
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rides.into_iter().map(|ride| self.to_response(ride)).collect())
    }

    async fn claim_ride(&self, ride_id: &str, driver_id: &str) -> Result<RideResponse, AppError> {
        if !IdGenerator::validate_id(ride_id, Some(IdType::Ride)) {
            return Err(AppError::validation_error("ride_id", "Invalid ride ID format"));
        }

        tracing::info!("Driver {} claiming ride {}", driver_id, ride_id);

        let driver = self
            .profiles
            .driver(driver_id)
            .await?
            .ok_or_else(|| AppError::driver_not_found(driver_id))?;

        if !driver.online {
            return Err(AppError::DriverNotOnline(driver_id.to_string()));
        }

        // The store makes this conditional on the ride still being
        // unclaimed; the loser of a race gets ClaimConflict, never a
        // silent overwrite.
        let claimed = self
            .rides
            .claim_ride(ride_id, &driver.snapshot())
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => AppError::ride_not_found(ride_id),
                other => AppError::from(other),
            })?;

        // Local mirror and passenger push are best-effort side effects.
        let (_, notified) = futures::join!(
            self.history.record(&claimed),
            self.notification_service.notify_driver_assigned(&claimed),
        );
        if let Err(err) = notified {
            tracing::warn!("Passenger notification failed for ride {}: {}", ride_id, err);
        }

        tracing::info!("Driver {} assigned to ride {}", driver_id, ride_id);

        Ok(self.to_response(claimed))
    }

    async fn reject_ride(&self, ride_id: &str, driver_id: &str) -> Result<RideResponse, AppError> {
        if !IdGenerator::validate_id(ride_id, Some(IdType::Ride)) {
            return Err(AppError::validation_error("ride_id", "Invalid ride ID format"));
        }

        tracing::info!("Driver {} rejecting ride {}", driver_id, ride_id);

        if self.profiles.driver(driver_id).await?.is_none() {
            return Err(AppError::driver_not_found(driver_id));
        }

        let ride = self.load_ride(ride_id).await?;
        if !ride.status.can_transition_to(RideStatus::Rejected) {
            return Err(AppError::InvalidTransition {
                from: ride.status,
                to: RideStatus::Rejected,
            });
        }

        // Terminal: a rejected ride does not re-enter the searching pool.
        let rejected = self
            .rides
            .update_status(ride_id, RideStatus::Rejected, Some(driver_id))
            .await?;

        self.history.record(&rejected).await;

        Ok(self.to_response(rejected))
    }

    async fn advance_ride(
        &self,
        ride_id: &str,
        driver_id: &str,
        next: RideStatus,
    ) -> Result<RideResponse, AppError> {
        if !matches!(
            next,
            RideStatus::DriverArrived | RideStatus::PickedUp | RideStatus::Completed
        ) {
            return Err(AppError::bad_request(format!(
                "Status {next} cannot be set through a driver update"
            )));
        }

        tracing::info!("Updating ride {} to {}", ride_id, next);

        let ride = self.load_ride(ride_id).await?;

        // Single-writer convention: only the assigned driver advances the
        // ride. The store does not enforce this, so it is checked here
        // before any write goes out.
        let assigned = ride.driver.as_ref().map(|d| d.driver_id.as_str());
        if assigned != Some(driver_id) {
            return Err(AppError::NotAssignedDriver(driver_id.to_string()));
        }

        if !ride.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition { from: ride.status, to: next });
        }

        let updated = self.rides.update_status(ride_id, next, None).await?;

        if next == RideStatus::Completed {
            // TODO: bump the driver's total_rides counter here once profile
            // writes are routed through this service.
            self.history.record(&updated).await;
            if let Err(err) = self.notification_service.notify_ride_completed(&updated).await {
                tracing::warn!("Completion notification failed for ride {}: {}", ride_id, err);
            }
        } else if let Err(err) = self.notification_service.notify_ride_status(&updated).await {
            tracing::warn!("Status notification failed for ride {}: {}", ride_id, err);
        }

        Ok(self.to_response(updated))
    }

    async fn rate_ride(&self, ride_id: &str, request: RatingRequest) -> Result<RideResponse, AppError> {
        tracing::info!("Rating ride {}", ride_id);

        if !(1.0..=5.0).contains(&request.rating) {
            return Err(AppError::validation_error("rating", "Rating must be between 1 and 5"));
        }

        let ride = self.load_ride(ride_id).await?;

        if ride.passenger_id != request.passenger_id {
            return Err(AppError::Forbidden(
                "Only the ride's passenger may rate it".to_string(),
            ));
        }

        if !ride.status.can_transition_to(RideStatus::Rated) {
            return Err(AppError::InvalidTransition { from: ride.status, to: RideStatus::Rated });
        }

        let driver_id = ride
            .driver
            .as_ref()
            .map(|d| d.driver_id.clone())
            .ok_or_else(|| AppError::internal_error("Completed ride has no driver snapshot"))?;

        let rating = RideRating {
            id: Uuid::new_v4().to_string(),
            ride_id: ride_id.to_string(),
            driver_id,
            passenger_id: request.passenger_id,
            rating: request.rating,
            feedback: request.feedback.unwrap_or_default(),
            created_at: Utc::now(),
        };

        // Two separate writes with no transaction across them. If the
        // status write fails the rating is kept; the ride stays completed
        // and re-rating overwrites the same document.
        self.rides.put_rating(&rating).await?;

        let rated = self
            .rides
            .update_status(ride_id, RideStatus::Rated, None)
            .await
            .map_err(|err| {
                tracing::warn!("Rating stored but status write failed for ride {}: {}", ride_id, err);
                AppError::from(err)
            })?;

        Ok(self.to_response(rated))
    }
}

impl RideService {
    /// Live feed of the open-request list for driver clients, newest
    /// first, delivered as whole snapshots.
    pub async fn watch_open_requests(&self) -> Result<broadcast::Receiver<Vec<Ride>>, AppError> {
        Ok(self.rides.subscribe_searching().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::DriverProfile;
    use crate::models::passenger::Passenger;
    use crate::models::ride::{Coordinates, VehicleClass};
    use crate::services::notification_service::MockNotificationService;
    use crate::store::{HistoryStore, MemoryStore};

    const MAIN_GATE: Coordinates = Coordinates { latitude: -26.1908, longitude: 28.0307 };
    const STUDENT_CENTER: Coordinates = Coordinates { latitude: -26.1915, longitude: 28.0312 };

    struct Fixture {
        store: Arc<MemoryStore>,
        service: RideService,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let history = Arc::new(HistoryService::new(store.clone()));
            let service = RideService::new(
                store.clone(),
                store.clone(),
                history,
                Arc::new(MockNotificationService),
            );
            let fixture = Self { store, service };
            fixture.seed_passenger("psg-one").await;
            fixture.seed_driver("drv-one", true).await;
            fixture
        }

        async fn seed_passenger(&self, id: &str) {
            let now = Utc::now();
            let passenger = Passenger {
                id: id.to_string(),
                full_name: "Thandi M".to_string(),
                email: "thandi@uj.ac.za".to_string(),
                institution: "University of Johannesburg".to_string(),
                course: "BSc Computer Science".to_string(),
                phone_number: "+27821230000".to_string(),
                gender: "female".to_string(),
                wallet_balance: 100.0,
                total_rides: 0,
                rating: 0.0,
                device_token: None,
                created_at: now,
                updated_at: now,
            };
            ProfileStore::put_passenger(self.store.as_ref(), &passenger).await.unwrap();
        }

        async fn seed_driver(&self, id: &str, online: bool) {
            let now = Utc::now();
            let driver = DriverProfile {
                id: id.to_string(),
                full_name: "Sipho K".to_string(),
                email: "sipho@uj.ac.za".to_string(),
                phone_number: "+27821234567".to_string(),
                car_model: "Toyota Etios".to_string(),
                vehicle_color: "White".to_string(),
                car_registration: "GP 123-456".to_string(),
                online,
                rating: 4.8,
                total_rides: 120,
                device_token: None,
                created_at: now,
                updated_at: now,
            };
            ProfileStore::put_driver(self.store.as_ref(), &driver).await.unwrap();
        }

        fn request(&self) -> RideRequest {
            RideRequest {
                passenger_id: "psg-one".to_string(),
                passenger_name: "Thandi M".to_string(),
                passenger_email: "thandi@uj.ac.za".to_string(),
                pickup_location: "Main Campus Gate".to_string(),
                pickup_coordinates: MAIN_GATE,
                dropoff_location: "Student Center".to_string(),
                dropoff_coordinates: STUDENT_CENTER,
                vehicle_class: VehicleClass::Standard,
            }
        }

        async fn booked_ride(&self) -> RideResponse {
            self.service.request_ride(self.request()).await.unwrap()
        }

        /// Drive a fresh ride all the way to completed.
        async fn completed_ride(&self) -> RideResponse {
            let ride = self.booked_ride().await;
            self.service.claim_ride(&ride.id, "drv-one").await.unwrap();
            self.service.advance_ride(&ride.id, "drv-one", RideStatus::DriverArrived).await.unwrap();
            self.service.advance_ride(&ride.id, "drv-one", RideStatus::PickedUp).await.unwrap();
            self.service.advance_ride(&ride.id, "drv-one", RideStatus::Completed).await.unwrap()
        }
    }

    #[tokio::test]
    async fn booking_fixes_fare_time_and_distance() {
        let fx = Fixture::new().await;
        let ride = fx.booked_ride().await;

        assert_eq!(ride.status, RideStatus::Searching);
        assert!(ride.driver.is_none());
        assert!((ride.estimated_fare - 25.47).abs() < 0.05);
        assert_eq!(ride.estimated_time_min, 3);
        assert!(ride.id.starts_with("rid-"));

        // Round-trip: the stored record carries identical immutable fields.
        let stored = fx.service.get_ride(&ride.id).await.unwrap().unwrap();
        assert_eq!(stored.passenger_id, ride.passenger_id);
        assert_eq!(stored.pickup_coordinates, ride.pickup_coordinates);
        assert_eq!(stored.dropoff_coordinates, ride.dropoff_coordinates);
        assert_eq!(stored.estimated_fare, ride.estimated_fare);
        assert_eq!(stored.distance_km, ride.distance_km);
        assert_eq!(stored.vehicle_class, ride.vehicle_class);
        assert_eq!(stored.created_at, ride.created_at);
    }

    #[tokio::test]
    async fn booking_rejects_bad_input() {
        let fx = Fixture::new().await;

        let mut request = fx.request();
        request.pickup_location = String::new();
        assert!(matches!(
            fx.service.request_ride(request).await,
            Err(AppError::ValidationFailed(_))
        ));

        let mut request = fx.request();
        request.dropoff_location = request.pickup_location.clone();
        assert!(matches!(
            fx.service.request_ride(request).await,
            Err(AppError::ValidationFailed(_))
        ));

        let mut request = fx.request();
        request.pickup_coordinates = Coordinates::new(0.0, 0.0);
        assert!(matches!(
            fx.service.request_ride(request).await,
            Err(AppError::ValidationFailed(_))
        ));

        let mut request = fx.request();
        request.passenger_id = "psg-nobody".to_string();
        assert!(matches!(
            fx.service.request_ride(request).await,
            Err(AppError::PassengerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn claim_stamps_driver_snapshot() {
        let fx = Fixture::new().await;
        let ride = fx.booked_ride().await;

        let claimed = fx.service.claim_ride(&ride.id, "drv-one").await.unwrap();
        assert_eq!(claimed.status, RideStatus::DriverAssigned);

        let snapshot = claimed.driver.unwrap();
        assert_eq!(snapshot.driver_id, "drv-one");
        assert_eq!(snapshot.vehicle_model, "Toyota Etios");
        assert_eq!(snapshot.vehicle_registration, "GP 123-456");

        // Claiming mirrors the event locally, unsynced.
        let record = HistoryStore::by_ride_id(fx.store.as_ref(), &ride.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RideStatus::DriverAssigned);
        assert!(!record.synced);
    }

    #[tokio::test]
    async fn concurrent_claims_yield_one_winner() {
        let fx = Fixture::new().await;
        fx.seed_driver("drv-two", true).await;
        let ride = fx.booked_ride().await;

        let (a, b) = tokio::join!(
            fx.service.claim_ride(&ride.id, "drv-one"),
            fx.service.claim_ride(&ride.id, "drv-two"),
        );

        assert!(a.is_ok() != b.is_ok(), "exactly one claim must win");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::ClaimConflict(_))));
    }

    #[tokio::test]
    async fn offline_driver_cannot_claim() {
        let fx = Fixture::new().await;
        fx.seed_driver("drv-off", false).await;
        let ride = fx.booked_ride().await;

        assert!(matches!(
            fx.service.claim_ride(&ride.id, "drv-off").await,
            Err(AppError::DriverNotOnline(_))
        ));
        assert!(matches!(
            fx.service.claim_ride(&ride.id, "drv-ghost").await,
            Err(AppError::DriverNotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_assigned_driver_advances() {
        let fx = Fixture::new().await;
        fx.seed_driver("drv-two", true).await;
        let ride = fx.booked_ride().await;
        fx.service.claim_ride(&ride.id, "drv-one").await.unwrap();

        assert!(matches!(
            fx.service.advance_ride(&ride.id, "drv-two", RideStatus::DriverArrived).await,
            Err(AppError::NotAssignedDriver(_))
        ));

        let arrived = fx
            .service
            .advance_ride(&ride.id, "drv-one", RideStatus::DriverArrived)
            .await
            .unwrap();
        assert_eq!(arrived.status, RideStatus::DriverArrived);
    }

    #[tokio::test]
    async fn transitions_outside_the_graph_fail() {
        let fx = Fixture::new().await;
        let ride = fx.booked_ride().await;
        fx.service.claim_ride(&ride.id, "drv-one").await.unwrap();

        // driver_assigned -> completed skips two states
        assert!(matches!(
            fx.service.advance_ride(&ride.id, "drv-one", RideStatus::Completed).await,
            Err(AppError::InvalidTransition { .. })
        ));

        let completed = fx.completed_ride().await;
        // completed -> driver_arrived walks backwards
        assert!(matches!(
            fx.service.advance_ride(&completed.id, "drv-one", RideStatus::DriverArrived).await,
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn completion_mirrors_history() {
        let fx = Fixture::new().await;
        let completed = fx.completed_ride().await;

        let record = HistoryStore::by_ride_id(fx.store.as_ref(), &completed.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RideStatus::Completed);
        assert!(!record.synced);
        assert_eq!(record.fare, completed.estimated_fare);
    }

    #[tokio::test]
    async fn rating_closes_the_ride() {
        let fx = Fixture::new().await;
        let completed = fx.completed_ride().await;

        let rated = fx
            .service
            .rate_ride(&completed.id, RatingRequest {
                passenger_id: "psg-one".to_string(),
                rating: 5.0,
                feedback: Some("Great driver".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(rated.status, RideStatus::Rated);

        // Terminal: no further rating or advancement.
        assert!(matches!(
            fx.service
                .rate_ride(&completed.id, RatingRequest {
                    passenger_id: "psg-one".to_string(),
                    rating: 4.0,
                    feedback: None,
                })
                .await,
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn rating_validates_caller_and_range() {
        let fx = Fixture::new().await;
        let completed = fx.completed_ride().await;

        assert!(matches!(
            fx.service
                .rate_ride(&completed.id, RatingRequest {
                    passenger_id: "psg-other".to_string(),
                    rating: 4.0,
                    feedback: None,
                })
                .await,
            Err(AppError::Forbidden(_))
        ));

        assert!(matches!(
            fx.service
                .rate_ride(&completed.id, RatingRequest {
                    passenger_id: "psg-one".to_string(),
                    rating: 6.0,
                    feedback: None,
                })
                .await,
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn rejected_rides_leave_the_pool_for_good() {
        let fx = Fixture::new().await;
        let ride = fx.booked_ride().await;

        let rejected = fx.service.reject_ride(&ride.id, "drv-one").await.unwrap();
        assert_eq!(rejected.status, RideStatus::Rejected);

        assert!(fx.service.open_requests().await.unwrap().is_empty());
        assert!(matches!(
            fx.service.claim_ride(&ride.id, "drv-one").await,
            Err(AppError::ClaimConflict(_))
        ));

        let record = HistoryStore::by_ride_id(fx.store.as_ref(), &ride.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RideStatus::Rejected);
        assert_eq!(record.driver_id.as_deref(), Some("drv-one"));
    }

    #[tokio::test]
    async fn open_requests_are_newest_first() {
        let fx = Fixture::new().await;
        let first = fx.booked_ride().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = fx.booked_ride().await;

        let open = fx.service.open_requests().await.unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, second.id);
        assert_eq!(open[1].id, first.id);
    }
}
