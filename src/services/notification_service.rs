// src/services/notification_service.rs
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing;

use crate::{
    errors::CampusRideError as AppError,
    models::ride::Ride,
    store::ProfileStore,
};

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub fcm_server_key: String,
    pub fcm_url: String,
}

impl FcmConfig {
    pub fn new(fcm_server_key: String) -> Self {
        Self {
            fcm_server_key,
            fcm_url: "https://fcm.googleapis.com/fcm/send".to_string(),
        }
    }
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_to_device(&self, device_token: &str, message: NotificationMessage) -> Result<(), AppError>;
    async fn send_to_passenger(&self, passenger_id: &str, message: NotificationMessage) -> Result<(), AppError>;
    async fn notify_driver_assigned(&self, ride: &Ride) -> Result<(), AppError>;
    async fn notify_ride_status(&self, ride: &Ride) -> Result<(), AppError>;
    async fn notify_ride_completed(&self, ride: &Ride) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub priority: NotificationPriority,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPriority {
    Normal,
    High, // Will wake sleeping devices
}

impl Default for NotificationPriority {
    fn default() -> Self {
        Self::High
    }
}

pub struct FcmNotificationService {
    config: FcmConfig,
    client: reqwest::Client,
    profiles: Arc<dyn ProfileStore>,
}

impl FcmNotificationService {
    pub fn new(config: FcmConfig, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            profiles,
        }
    }

    async fn get_passenger_device_token(&self, passenger_id: &str) -> Result<String, AppError> {
        if let Some(passenger) = self.profiles.passenger(passenger_id).await? {
            passenger
                .device_token
                .ok_or_else(|| AppError::FcmInvalidToken("Passenger has no device token".to_string()))
        } else {
            Err(AppError::PassengerNotFound(passenger_id.to_string()))
        }
    }
}

#[async_trait]
impl NotificationService for FcmNotificationService {
    async fn send_to_device(&self, device_token: &str, message: NotificationMessage) -> Result<(), AppError> {
        if device_token.is_empty() {
            return Err(AppError::FcmInvalidToken("Empty device token".to_string()));
        }

        tracing::info!("Sending FCM notification to device: {}", device_token);

        let mut fcm_message = json!({
            "to": device_token,
            "notification": {
                "title": message.title,
                "body": message.body,
                "sound": "default"
            },
            "priority": match message.priority {
                NotificationPriority::High => "high",
                NotificationPriority::Normal => "normal",
            }
        });

        if let Some(data) = message.data {
            fcm_message["data"] = data;
        }

        let response = self.client
            .post(&self.config.fcm_url)
            .header("Authorization", format!("key={}", self.config.fcm_server_key))
            .header("Content-Type", "application/json")
            .json(&fcm_message)
            .send()
            .await
            .map_err(|e| AppError::NetworkConnection(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("FCM request failed: {}", error_text);
            return Err(AppError::FcmDelivery(error_text));
        }

        tracing::debug!("FCM notification sent successfully");
        Ok(())
    }

    async fn send_to_passenger(&self, passenger_id: &str, message: NotificationMessage) -> Result<(), AppError> {
        let device_token = self.get_passenger_device_token(passenger_id).await?;
        self.send_to_device(&device_token, message).await
    }

    async fn notify_driver_assigned(&self, ride: &Ride) -> Result<(), AppError> {
        let driver_name = ride
            .driver
            .as_ref()
            .map(|d| d.driver_name.clone())
            .unwrap_or_else(|| "Your driver".to_string());

        let message = NotificationMessage {
            title: "🚗 Driver Found!".to_string(),
            body: format!("{} is on the way to {}", driver_name, ride.pickup_location),
            data: Some(json!({
                "type": "driver_assigned",
                "ride_id": ride.id,
                "driver_name": driver_name,
                "vehicle": ride.driver.as_ref().map(|d| format!("{} ({})", d.vehicle_model, d.vehicle_color)),
                "fare": ride.estimated_fare,
            })),
            priority: NotificationPriority::High,
        };

        self.send_to_passenger(&ride.passenger_id, message).await
    }

    async fn notify_ride_status(&self, ride: &Ride) -> Result<(), AppError> {
        let (title, body) = match ride.status.as_str() {
            "driver_arrived" => (
                "📍 Driver Arrived".to_string(),
                "Your driver is waiting at the pickup point".to_string(),
            ),
            "picked_up" => (
                "🛣️ On The Way".to_string(),
                format!("Heading to {}", ride.dropoff_location),
            ),
            other => (
                "📋 Status Updated".to_string(),
                format!("Ride status: {}", other),
            ),
        };

        let message = NotificationMessage {
            title,
            body,
            data: Some(json!({
                "type": "status_update",
                "ride_id": ride.id,
                "status": ride.status,
                "timestamp": Utc::now().to_rfc3339(),
            })),
            priority: NotificationPriority::Normal,
        };

        self.send_to_passenger(&ride.passenger_id, message).await
    }

    async fn notify_ride_completed(&self, ride: &Ride) -> Result<(), AppError> {
        let message = NotificationMessage {
            title: "✅ Ride Completed".to_string(),
            body: format!("You have arrived at {}. Rate your driver!", ride.dropoff_location),
            data: Some(json!({
                "type": "ride_completed",
                "ride_id": ride.id,
                "fare": ride.estimated_fare,
                "completion_time": Utc::now().to_rfc3339(),
            })),
            priority: NotificationPriority::Normal,
        };

        self.send_to_passenger(&ride.passenger_id, message).await
    }
}

// Mock service for development and testing
#[derive(Debug)]
pub struct MockNotificationService;

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send_to_device(&self, device_token: &str, message: NotificationMessage) -> Result<(), AppError> {
        tracing::info!("[MOCK] Would send FCM to {}: {} - {}",
            device_token, message.title, message.body);
        Ok(())
    }

    async fn send_to_passenger(&self, passenger_id: &str, message: NotificationMessage) -> Result<(), AppError> {
        tracing::info!("[MOCK] Would send to passenger {}: {} - {}",
            passenger_id, message.title, message.body);
        Ok(())
    }

    async fn notify_driver_assigned(&self, ride: &Ride) -> Result<(), AppError> {
        tracing::info!("[MOCK] Driver assigned on ride: {}", ride.id);
        Ok(())
    }

    async fn notify_ride_status(&self, ride: &Ride) -> Result<(), AppError> {
        tracing::info!("[MOCK] Status update for ride {}: {}", ride.id, ride.status);
        Ok(())
    }

    async fn notify_ride_completed(&self, ride: &Ride) -> Result<(), AppError> {
        tracing::info!("[MOCK] Ride completed: {}", ride.id);
        Ok(())
    }
}

// Helper functions for creating notifications
impl NotificationMessage {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            data: None,
            priority: NotificationPriority::default(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}
