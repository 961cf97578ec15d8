// src/handlers/driver_handler.rs
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::{
    errors::{CampusRideError, CampusRideResult},
    models::driver::{DeviceTokenUpdate, DriverRegistration, DriverResponse, OnlineStatusUpdate},
    services::driver_service::DriverOperations,
    state::AppState,
};

pub async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<DriverRegistration>,
) -> CampusRideResult<Json<DriverResponse>> {
    Ok(Json(state.driver_service.register_driver(registration).await?))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> CampusRideResult<Json<DriverResponse>> {
    state
        .driver_service
        .get_driver(&driver_id)
        .await?
        .map(Json)
        .ok_or_else(|| CampusRideError::driver_not_found(driver_id))
}

pub async fn set_online(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(update): Json<OnlineStatusUpdate>,
) -> CampusRideResult<Json<DriverResponse>> {
    Ok(Json(state.driver_service.set_online(&driver_id, update.online).await?))
}

pub async fn update_device_token(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(update): Json<DeviceTokenUpdate>,
) -> CampusRideResult<Json<DriverResponse>> {
    Ok(Json(
        state
            .driver_service
            .update_device_token(&driver_id, update.device_token)
            .await?,
    ))
}
