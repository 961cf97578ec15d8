// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CampusRideResult;
use crate::services::driver_service::DriverService;
use crate::services::identity_service::{FirebaseAuthClient, IdentityProvider, MockIdentityProvider};
use crate::services::notification_service::{
    FcmConfig, FcmNotificationService, MockNotificationService, NotificationService,
};
use crate::services::passenger_service::PassengerService;
use crate::services::ride_service::RideService;
use crate::services::sync_service::{HistoryService, SyncWorker};
use crate::store::{
    FirebaseStore, HistorySink, HistoryStore, MemoryStore, ProfileStore, RedisHistoryStore,
    RideStore,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub firebase_url: Option<String>,
    pub firebase_auth_key: Option<String>,
    pub redis_url: Option<String>,
    pub fcm_server_key: Option<String>,
    pub write_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub sync_interval_secs: u64,
}

impl AppConfig {
    /// Read configuration from `CAMPUSRIDE_*` environment variables,
    /// falling back to defaults suitable for local development.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("CAMPUSRIDE_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            firebase_url: std::env::var("CAMPUSRIDE_FIREBASE_URL").ok(),
            firebase_auth_key: std::env::var("CAMPUSRIDE_FIREBASE_AUTH_KEY").ok(),
            redis_url: std::env::var("CAMPUSRIDE_REDIS_URL").ok(),
            fcm_server_key: std::env::var("CAMPUSRIDE_FCM_SERVER_KEY").ok(),
            write_timeout_secs: parse_env("CAMPUSRIDE_WRITE_TIMEOUT_SECS", 10),
            poll_interval_secs: parse_env("CAMPUSRIDE_POLL_INTERVAL_SECS", 2),
            sync_interval_secs: parse_env("CAMPUSRIDE_SYNC_INTERVAL_SECS", 30),
        }
    }
}

fn parse_env(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub struct AppState {
    pub ride_service: Arc<RideService>,
    pub driver_service: Arc<DriverService>,
    pub passenger_service: Arc<PassengerService>,
    pub sync_worker: Arc<SyncWorker>,
    pub config: AppConfig,
}

impl AppState {
    /// Build all services with explicitly injected client handles. Missing
    /// credentials swap in the in-process fallbacks so a keyless dev run
    /// still works end to end.
    pub async fn new(config: AppConfig) -> CampusRideResult<Self> {
        let (rides, profiles, sink): (Arc<dyn RideStore>, Arc<dyn ProfileStore>, Arc<dyn HistorySink>) =
            match &config.firebase_url {
                Some(url) => {
                    let store = Arc::new(FirebaseStore::new(
                        url,
                        Duration::from_secs(config.write_timeout_secs),
                        Duration::from_secs(config.poll_interval_secs),
                    )?);
                    let _watcher = store.clone().spawn_watcher();
                    (store.clone(), store.clone(), store)
                }
                None => {
                    tracing::warn!("CAMPUSRIDE_FIREBASE_URL not set, using in-memory store");
                    let store = Arc::new(MemoryStore::new());
                    (store.clone(), store.clone(), store)
                }
            };

        let local_history: Arc<dyn HistoryStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisHistoryStore::new(url)?),
            None => {
                tracing::warn!("CAMPUSRIDE_REDIS_URL not set, keeping history in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let notification_service: Arc<dyn NotificationService> = match &config.fcm_server_key {
            Some(key) => Arc::new(FcmNotificationService::new(
                FcmConfig::new(key.clone()),
                profiles.clone(),
            )),
            None => {
                tracing::warn!("CAMPUSRIDE_FCM_SERVER_KEY not set, using mock notification service");
                Arc::new(MockNotificationService)
            }
        };

        let identity: Arc<dyn IdentityProvider> = match &config.firebase_auth_key {
            Some(key) => Arc::new(FirebaseAuthClient::new(key.clone())),
            None => {
                tracing::warn!("CAMPUSRIDE_FIREBASE_AUTH_KEY not set, using mock identity provider");
                Arc::new(MockIdentityProvider::new())
            }
        };

        let history = Arc::new(HistoryService::new(local_history.clone()));
        let ride_service = Arc::new(RideService::new(
            rides,
            profiles.clone(),
            history,
            notification_service,
        ));
        let driver_service = Arc::new(DriverService::new(profiles.clone(), identity.clone()));
        let passenger_service = Arc::new(PassengerService::new(profiles, identity));
        let sync_worker = Arc::new(SyncWorker::new(
            local_history,
            sink,
            Duration::from_secs(config.sync_interval_secs),
        ));

        Ok(Self {
            ride_service,
            driver_service,
            passenger_service,
            sync_worker,
            config,
        })
    }
}
