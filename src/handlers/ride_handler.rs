// src/handlers/ride_handler.rs
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::{
    errors::{CampusRideError, CampusRideResult},
    models::ride::{
        ClaimRequest, RatingRequest, RejectRequest, RideRequest, RideResponse,
        StatusUpdateRequest,
    },
    services::ride_service::RideOperations,
    state::AppState,
};

pub async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RideRequest>,
) -> CampusRideResult<Json<RideResponse>> {
    Ok(Json(state.ride_service.request_ride(request).await?))
}

pub async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
) -> CampusRideResult<Json<RideResponse>> {
    state
        .ride_service
        .get_ride(&ride_id)
        .await?
        .map(Json)
        .ok_or_else(|| CampusRideError::ride_not_found(ride_id))
}

/// The open-request list driver clients poll between subscription pushes.
pub async fn open_rides(
    State(state): State<Arc<AppState>>,
) -> CampusRideResult<Json<Vec<RideResponse>>> {
    Ok(Json(state.ride_service.open_requests().await?))
}

pub async fn claim_ride(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> CampusRideResult<Json<RideResponse>> {
    Ok(Json(state.ride_service.claim_ride(&ride_id, &request.driver_id).await?))
}

pub async fn reject_ride(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> CampusRideResult<Json<RideResponse>> {
    Ok(Json(state.ride_service.reject_ride(&ride_id, &request.driver_id).await?))
}

pub async fn update_ride_status(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> CampusRideResult<Json<RideResponse>> {
    Ok(Json(
        state
            .ride_service
            .advance_ride(&ride_id, &request.driver_id, request.status)
            .await?,
    ))
}

pub async fn rate_ride(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> CampusRideResult<Json<RideResponse>> {
    Ok(Json(state.ride_service.rate_ride(&ride_id, request).await?))
}
