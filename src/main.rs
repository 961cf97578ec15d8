use std::sync::Arc;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use campusride_realtime::{
    handlers::{driver_handler, passenger_handler, ride_handler},
    state::{AppConfig, AppState},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(config)
        .await
        .expect("failed to initialize application state");

    // Background mirror of local ride history to the remote store.
    let _mirror = app_state.sync_worker.clone().spawn();

    let app = Router::new()
        .route("/rides", post(ride_handler::create_ride).get(ride_handler::open_rides))
        .route("/rides/:ride_id", get(ride_handler::get_ride))
        .route("/rides/:ride_id/claim", post(ride_handler::claim_ride))
        .route("/rides/:ride_id/reject", post(ride_handler::reject_ride))
        .route("/rides/:ride_id/status", post(ride_handler::update_ride_status))
        .route("/rides/:ride_id/rating", post(ride_handler::rate_ride))
        .route("/drivers", post(driver_handler::register_driver))
        .route("/drivers/:driver_id", get(driver_handler::get_driver))
        .route("/drivers/:driver_id/online", post(driver_handler::set_online))
        .route("/drivers/:driver_id/device-token", post(driver_handler::update_device_token))
        .route("/passengers", post(passenger_handler::register_passenger))
        .route("/passengers/:passenger_id", get(passenger_handler::get_passenger))
        .route("/passengers/:passenger_id/rides", get(passenger_handler::ride_history))
        .route(
            "/passengers/:passenger_id/wallet",
            get(passenger_handler::wallet_balance).post(passenger_handler::top_up_wallet),
        )
        .route(
            "/passengers/:passenger_id/device-token",
            post(passenger_handler::update_device_token),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(app_state));

    tracing::info!("campusride-realtime listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
