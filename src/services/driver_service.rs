// src/services/driver_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    ValidationError,
    errors::CampusRideError as AppError,
    models::driver::{DriverProfile, DriverRegistration, DriverResponse},
    services::identity_service::IdentityProvider,
    store::{ProfileStore, StoreError},
};

const MIN_PASSWORD_LEN: usize = 6;

#[async_trait]
pub trait DriverOperations: Send + Sync {
    async fn register_driver(&self, registration: DriverRegistration) -> Result<DriverResponse, AppError>;
    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverResponse>, AppError>;
    async fn set_online(&self, driver_id: &str, online: bool) -> Result<DriverResponse, AppError>;
    async fn update_device_token(&self, driver_id: &str, device_token: String) -> Result<DriverResponse, AppError>;
}

pub struct DriverService {
    profiles: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl DriverService {
    pub fn new(profiles: Arc<dyn ProfileStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { profiles, identity }
    }

    fn to_response(&self, driver: DriverProfile) -> DriverResponse {
        DriverResponse {
            id: driver.id,
            full_name: driver.full_name,
            phone_number: driver.phone_number,
            car_model: driver.car_model,
            vehicle_color: driver.vehicle_color,
            car_registration: driver.car_registration,
            online: driver.online,
            rating: driver.rating,
            total_rides: driver.total_rides,
        }
    }

    fn validate_registration(registration: &DriverRegistration) -> Result<(), AppError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("full_name", &registration.full_name),
            ("phone_number", &registration.phone_number),
            ("car_model", &registration.car_model),
            ("vehicle_color", &registration.vehicle_color),
            ("car_registration", &registration.car_registration),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("{field} is required"),
                });
            }
        }

        if !registration.email.contains('@') {
            errors.push(ValidationError {
                field: "email".to_string(),
                message: "A valid email address is required".to_string(),
            });
        }
        if registration.password.len() < MIN_PASSWORD_LEN {
            errors.push(ValidationError {
                field: "password".to_string(),
                message: format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
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
impl DriverOperations for DriverService {
    async fn register_driver(&self, registration: DriverRegistration) -> Result<DriverResponse, AppError> {
        tracing::info!("Registering driver: {}", registration.email);

        Self::validate_registration(&registration)?;

        let identity = self
            .identity
            .create_identity(&registration.email, &registration.password)
            .await?;

        let now = Utc::now();
        let driver = DriverProfile {
            id: identity.uid.clone(),
            full_name: registration.full_name,
            email: identity.email.clone(),
            phone_number: registration.phone_number,
            car_model: registration.car_model,
            vehicle_color: registration.vehicle_color,
            car_registration: registration.car_registration,
            online: false,
            rating: 0.0,
            total_rides: 0,
            device_token: None,
            created_at: now,
            updated_at: now,
        };

        // Same two-step flow as passenger registration: a failed profile
        // write deletes the identity again instead of leaving an orphan.
        if let Err(err) = self.profiles.put_driver(&driver).await {
            tracing::error!("Profile write failed for {}, rolling back identity: {}", identity.uid, err);
            if let Err(rollback_err) = self.identity.delete_identity(&identity).await {
                tracing::error!("Identity rollback also failed for {}: {}", identity.uid, rollback_err);
            }
            return Err(err.into());
        }

        tracing::info!("Driver registered successfully: {}", driver.id);

        Ok(self.to_response(driver))
    }

    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverResponse>, AppError> {
        tracing::debug!("Getting driver: {}", driver_id);

        Ok(self
            .profiles
            .driver(driver_id)
            .await?
            .map(|driver| self.to_response(driver)))
    }

    async fn set_online(&self, driver_id: &str, online: bool) -> Result<DriverResponse, AppError> {
        tracing::info!("Driver {} going {}", driver_id, if online { "online" } else { "offline" });

        let driver = self
            .profiles
            .set_driver_online(driver_id, online)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => AppError::driver_not_found(driver_id),
                other => AppError::from(other),
            })?;

        Ok(self.to_response(driver))
    }

    async fn update_device_token(&self, driver_id: &str, device_token: String) -> Result<DriverResponse, AppError> {
        tracing::debug!("Updating device token for driver: {}", driver_id);

        let mut driver = self
            .profiles
            .driver(driver_id)
            .await?
            .ok_or_else(|| AppError::driver_not_found(driver_id))?;

        driver.device_token = Some(device_token);
        driver.updated_at = Utc::now();
        self.profiles.put_driver(&driver).await?;

        Ok(self.to_response(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity_service::MockIdentityProvider;
    use crate::store::MemoryStore;

    fn registration() -> DriverRegistration {
        DriverRegistration {
            full_name: "Sipho K".to_string(),
            email: "sipho@uj.ac.za".to_string(),
            phone_number: "+27821234567".to_string(),
            password: "secret123".to_string(),
            car_model: "Toyota Etios".to_string(),
            vehicle_color: "White".to_string(),
            car_registration: "GP 123-456".to_string(),
        }
    }

    fn service() -> DriverService {
        DriverService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MockIdentityProvider::new()),
        )
    }

    #[tokio::test]
    async fn new_drivers_start_offline() {
        let service = service();
        let driver = service.register_driver(registration()).await.unwrap();
        assert!(!driver.online);
        assert_eq!(driver.total_rides, 0);
        assert_eq!(driver.car_registration, "GP 123-456");
    }

    #[tokio::test]
    async fn online_flag_round_trips() {
        let service = service();
        let driver = service.register_driver(registration()).await.unwrap();

        let online = service.set_online(&driver.id, true).await.unwrap();
        assert!(online.online);

        let stored = service.get_driver(&driver.id).await.unwrap().unwrap();
        assert!(stored.online);

        let offline = service.set_online(&driver.id, false).await.unwrap();
        assert!(!offline.online);

        assert!(matches!(
            service.set_online("drv-ghost", true).await,
            Err(AppError::DriverNotFound(_))
        ));
    }

    #[tokio::test]
    async fn registration_rejects_missing_vehicle_fields() {
        let service = service();
        let mut bad = registration();
        bad.car_registration = String::new();
        assert!(matches!(
            service.register_driver(bad).await,
            Err(AppError::ValidationFailed(_))
        ));
    }
}
