// src/services/passenger_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    ValidationError,
    errors::CampusRideError as AppError,
    models::passenger::{
        Passenger, PassengerRegistration, PassengerResponse, WalletResponse,
    },
    services::identity_service::IdentityProvider,
    store::{ProfileStore, StoreError},
};

/// Every new passenger starts with this wallet credit.
pub const STARTING_WALLET_CREDIT: f64 = 100.0;

const MIN_PASSWORD_LEN: usize = 6;

#[async_trait]
pub trait PassengerOperations: Send + Sync {
    async fn register_passenger(&self, registration: PassengerRegistration) -> Result<PassengerResponse, AppError>;
    async fn get_passenger(&self, passenger_id: &str) -> Result<Option<PassengerResponse>, AppError>;
    async fn wallet_balance(&self, passenger_id: &str) -> Result<WalletResponse, AppError>;
    async fn top_up_wallet(&self, passenger_id: &str, amount: f64) -> Result<WalletResponse, AppError>;
    async fn update_device_token(&self, passenger_id: &str, device_token: String) -> Result<PassengerResponse, AppError>;
}

pub struct PassengerService {
    profiles: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl PassengerService {
    pub fn new(profiles: Arc<dyn ProfileStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { profiles, identity }
    }

    fn to_response(&self, passenger: Passenger) -> PassengerResponse {
        PassengerResponse {
            id: passenger.id,
            full_name: passenger.full_name,
            email: passenger.email,
            institution: passenger.institution,
            course: passenger.course,
            phone_number: passenger.phone_number,
            wallet_balance: passenger.wallet_balance,
            total_rides: passenger.total_rides,
            created_at: passenger.created_at,
        }
    }

    fn validate_registration(registration: &PassengerRegistration) -> Result<(), AppError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("institution", &registration.institution),
            ("full_name", &registration.full_name),
            ("course", &registration.course),
            ("phone_number", &registration.phone_number),
            ("gender", &registration.gender),
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
impl PassengerOperations for PassengerService {
    async fn register_passenger(&self, registration: PassengerRegistration) -> Result<PassengerResponse, AppError> {
        tracing::info!("Registering passenger: {}", registration.email);

        Self::validate_registration(&registration)?;

        let identity = self
            .identity
            .create_identity(&registration.email, &registration.password)
            .await?;

        let now = Utc::now();
        let passenger = Passenger {
            id: identity.uid.clone(),
            full_name: registration.full_name,
            email: identity.email.clone(),
            institution: registration.institution,
            course: registration.course,
            phone_number: registration.phone_number,
            gender: registration.gender,
            wallet_balance: STARTING_WALLET_CREDIT,
            total_rides: 0,
            rating: 0.0,
            device_token: None,
            created_at: now,
            updated_at: now,
        };

        // The identity write and the profile write cannot be joined in a
        // transaction; a failed profile write rolls the identity back so
        // no orphaned account is left behind.
        if let Err(err) = self.profiles.put_passenger(&passenger).await {
            tracing::error!("Profile write failed for {}, rolling back identity: {}", identity.uid, err);
            if let Err(rollback_err) = self.identity.delete_identity(&identity).await {
                tracing::error!("Identity rollback also failed for {}: {}", identity.uid, rollback_err);
            }
            return Err(err.into());
        }

        tracing::info!("Passenger registered successfully: {}", passenger.id);

        Ok(self.to_response(passenger))
    }

    async fn get_passenger(&self, passenger_id: &str) -> Result<Option<PassengerResponse>, AppError> {
        tracing::debug!("Getting passenger: {}", passenger_id);

        Ok(self
            .profiles
            .passenger(passenger_id)
            .await?
            .map(|passenger| self.to_response(passenger)))
    }

    async fn wallet_balance(&self, passenger_id: &str) -> Result<WalletResponse, AppError> {
        let passenger = self
            .profiles
            .passenger(passenger_id)
            .await?
            .ok_or_else(|| AppError::passenger_not_found(passenger_id))?;

        Ok(WalletResponse {
            passenger_id: passenger.id,
            balance: passenger.wallet_balance,
        })
    }

    async fn top_up_wallet(&self, passenger_id: &str, amount: f64) -> Result<WalletResponse, AppError> {
        if amount <= 0.0 {
            return Err(AppError::validation_error("amount", "Top-up amount must be positive"));
        }

        tracing::info!("Adding R{:.2} to wallet of {}", amount, passenger_id);

        let balance = self
            .profiles
            .adjust_wallet(passenger_id, amount)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => AppError::passenger_not_found(passenger_id),
                other => AppError::from(other),
            })?;

        Ok(WalletResponse {
            passenger_id: passenger_id.to_string(),
            balance,
        })
    }

    async fn update_device_token(&self, passenger_id: &str, device_token: String) -> Result<PassengerResponse, AppError> {
        tracing::debug!("Updating device token for passenger: {}", passenger_id);

        let mut passenger = self
            .profiles
            .passenger(passenger_id)
            .await?
            .ok_or_else(|| AppError::passenger_not_found(passenger_id))?;

        passenger.device_token = Some(device_token);
        passenger.updated_at = Utc::now();
        self.profiles.put_passenger(&passenger).await?;

        Ok(self.to_response(passenger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::DriverProfile;
    use crate::services::identity_service::MockIdentityProvider;
    use crate::store::{MemoryStore, StoreResult};

    fn registration() -> PassengerRegistration {
        PassengerRegistration {
            institution: "University of Johannesburg".to_string(),
            full_name: "Thandi M".to_string(),
            email: "thandi@uj.ac.za".to_string(),
            course: "BSc Computer Science".to_string(),
            phone_number: "+27821230000".to_string(),
            gender: "female".to_string(),
            password: "secret123".to_string(),
        }
    }

    fn service_with(store: Arc<dyn ProfileStore>) -> (PassengerService, Arc<MockIdentityProvider>) {
        let identity = Arc::new(MockIdentityProvider::new());
        (PassengerService::new(store, identity.clone()), identity)
    }

    #[tokio::test]
    async fn registration_seeds_the_wallet() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service_with(store.clone());

        let passenger = service.register_passenger(registration()).await.unwrap();
        assert_eq!(passenger.wallet_balance, STARTING_WALLET_CREDIT);
        assert_eq!(passenger.total_rides, 0);

        let wallet = service.wallet_balance(&passenger.id).await.unwrap();
        assert_eq!(wallet.balance, STARTING_WALLET_CREDIT);
    }

    #[tokio::test]
    async fn registration_rejects_bad_input() {
        let store = Arc::new(MemoryStore::new());
        let (service, identity) = service_with(store);

        let mut bad = registration();
        bad.password = "123".to_string();
        assert!(matches!(
            service.register_passenger(bad).await,
            Err(AppError::ValidationFailed(_))
        ));

        let mut bad = registration();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            service.register_passenger(bad).await,
            Err(AppError::ValidationFailed(_))
        ));

        // Validation failures never reach the identity provider.
        assert!(identity.deleted_uids().is_empty());
    }

    /// Profile store that always fails the profile write.
    struct BrokenProfiles;

    #[async_trait]
    impl ProfileStore for BrokenProfiles {
        async fn put_passenger(&self, _passenger: &Passenger) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
        async fn passenger(&self, _passenger_id: &str) -> StoreResult<Option<Passenger>> {
            Ok(None)
        }
        async fn put_driver(&self, _driver: &DriverProfile) -> StoreResult<()> {
            unimplemented!()
        }
        async fn driver(&self, _driver_id: &str) -> StoreResult<Option<DriverProfile>> {
            unimplemented!()
        }
        async fn set_driver_online(&self, _driver_id: &str, _online: bool) -> StoreResult<DriverProfile> {
            unimplemented!()
        }
        async fn adjust_wallet(&self, _passenger_id: &str, _delta: f64) -> StoreResult<f64> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn failed_profile_write_rolls_back_the_identity() {
        let (service, identity) = service_with(Arc::new(BrokenProfiles));

        let result = service.register_passenger(registration()).await;
        assert!(matches!(result, Err(AppError::RemoteUnavailable(_))));

        // The orphaned identity was deleted again.
        assert_eq!(identity.deleted_uids().len(), 1);
    }

    #[tokio::test]
    async fn top_up_adjusts_the_balance() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service_with(store.clone());
        let passenger = service.register_passenger(registration()).await.unwrap();

        let wallet = service.top_up_wallet(&passenger.id, 50.0).await.unwrap();
        assert_eq!(wallet.balance, STARTING_WALLET_CREDIT + 50.0);

        assert!(matches!(
            service.top_up_wallet(&passenger.id, 0.0).await,
            Err(AppError::ValidationFailed(_))
        ));
        assert!(matches!(
            service.top_up_wallet(&passenger.id, -10.0).await,
            Err(AppError::ValidationFailed(_))
        ));
        assert!(matches!(
            service.top_up_wallet("psg-ghost", 10.0).await,
            Err(AppError::PassengerNotFound(_))
        ));
    }
}
