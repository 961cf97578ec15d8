// src/models/driver.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::ride::DriverSnapshot;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriverProfile {
    pub id: String, // Identity-provider uid, opaque to the core
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub car_model: String,
    pub vehicle_color: String,
    pub car_registration: String,
    pub online: bool,
    pub rating: f64,
    pub total_rides: u32,
    pub device_token: Option<String>, // For push notifications
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DriverProfile {
    /// Profile copy stamped onto a ride at claim time.
    pub fn snapshot(&self) -> DriverSnapshot {
        DriverSnapshot {
            driver_id: self.id.clone(),
            driver_name: self.full_name.clone(),
            driver_phone: self.phone_number.clone(),
            vehicle_model: self.car_model.clone(),
            vehicle_color: self.vehicle_color.clone(),
            vehicle_registration: self.car_registration.clone(),
        }
    }
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct DriverRegistration {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub car_model: String,
    pub vehicle_color: String,
    pub car_registration: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverResponse {
    pub id: String,
    pub full_name: String,
    pub phone_number: String,
    pub car_model: String,
    pub vehicle_color: String,
    pub car_registration: String,
    pub online: bool,
    pub rating: f64,
    pub total_rides: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineStatusUpdate {
    pub online: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceTokenUpdate {
    pub device_token: String,
}
