// src/handlers/passenger_handler.rs
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::{
    errors::{CampusRideError, CampusRideResult},
    models::driver::DeviceTokenUpdate,
    models::passenger::{
        PassengerRegistration, PassengerResponse, WalletResponse, WalletTopUp,
    },
    models::ride::RideResponse,
    services::passenger_service::PassengerOperations,
    services::ride_service::RideOperations,
    state::AppState,
};

pub async fn register_passenger(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<PassengerRegistration>,
) -> CampusRideResult<Json<PassengerResponse>> {
    Ok(Json(state.passenger_service.register_passenger(registration).await?))
}

pub async fn get_passenger(
    State(state): State<Arc<AppState>>,
    Path(passenger_id): Path<String>,
) -> CampusRideResult<Json<PassengerResponse>> {
    state
        .passenger_service
        .get_passenger(&passenger_id)
        .await?
        .map(Json)
        .ok_or_else(|| CampusRideError::passenger_not_found(passenger_id))
}

/// Newest-first ride history for the passenger's own rides.
pub async fn ride_history(
    State(state): State<Arc<AppState>>,
    Path(passenger_id): Path<String>,
) -> CampusRideResult<Json<Vec<RideResponse>>> {
    Ok(Json(state.ride_service.rides_for_passenger(&passenger_id).await?))
}

pub async fn wallet_balance(
    State(state): State<Arc<AppState>>,
    Path(passenger_id): Path<String>,
) -> CampusRideResult<Json<WalletResponse>> {
    Ok(Json(state.passenger_service.wallet_balance(&passenger_id).await?))
}

pub async fn top_up_wallet(
    State(state): State<Arc<AppState>>,
    Path(passenger_id): Path<String>,
    Json(top_up): Json<WalletTopUp>,
) -> CampusRideResult<Json<WalletResponse>> {
    Ok(Json(
        state
            .passenger_service
            .top_up_wallet(&passenger_id, top_up.amount)
            .await?,
    ))
}

pub async fn update_device_token(
    State(state): State<Arc<AppState>>,
    Path(passenger_id): Path<String>,
    Json(update): Json<DeviceTokenUpdate>,
) -> CampusRideResult<Json<PassengerResponse>> {
    Ok(Json(
        state
            .passenger_service
            .update_device_token(&passenger_id, update.device_token)
            .await?,
    ))
}
