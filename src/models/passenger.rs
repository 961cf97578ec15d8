// src/models/passenger.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Passenger {
    pub id: String, // Identity-provider uid, opaque to the core
    pub full_name: String,
    pub email: String,
    pub institution: String,
    pub course: String,
    pub phone_number: String,
    pub gender: String,
    pub wallet_balance: f64,
    pub total_rides: u32,
    pub rating: f64,
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct PassengerRegistration {
    pub institution: String,
    pub full_name: String,
    pub email: String,
    pub course: String,
    pub phone_number: String,
    pub gender: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassengerResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub institution: String,
    pub course: String,
    pub phone_number: String,
    pub wallet_balance: f64,
    pub total_rides: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletTopUp {
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub passenger_id: String,
    pub balance: f64,
}
