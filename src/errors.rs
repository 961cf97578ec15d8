use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ride::RideStatus;

/// Main error type for the campusride-realtime service
#[derive(Debug)]
pub enum CampusRideError {
    // HTTP and API errors
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServer(String),

    // Remote store errors
    RemoteUnavailable(String),
    /// A write that never acknowledged. The outcome is unknown; the caller
    /// must re-query authoritative state, not assume success or failure.
    WriteIndeterminate(String),
    RedisConnection(String),
    RedisQuery(String),
    FirebaseDatabase(String),

    // External service errors
    IdentityProvider(String),
    FcmDelivery(String),
    FcmInvalidToken(String),

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),
    InvalidFormat(String),

    // Business logic errors
    RideNotFound(String),
    DriverNotFound(String),
    PassengerNotFound(String),
    /// Another driver won the race for this ride. Distinct from a transport
    /// failure: the ride exists and is already claimed.
    ClaimConflict(String),
    InvalidTransition { from: RideStatus, to: RideStatus },
    DriverNotOnline(String),
    NotAssignedDriver(String),

    // Validation errors
    ValidationFailed(Vec<ValidationError>),
    MissingRequiredField(String),
    InvalidFieldValue { field: String, value: String, reason: String },

    // Configuration and setup errors
    ConfigurationError(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for CampusRideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampusRideError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            CampusRideError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            CampusRideError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            CampusRideError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CampusRideError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            CampusRideError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            CampusRideError::RemoteUnavailable(msg) => write!(f, "Remote store unavailable: {}", msg),
            CampusRideError::WriteIndeterminate(msg) => {
                write!(f, "Write unacknowledged, outcome unknown: {}", msg)
            }
            CampusRideError::RedisConnection(msg) => write!(f, "Redis connection error: {}", msg),
            CampusRideError::RedisQuery(msg) => write!(f, "Redis query error: {}", msg),
            CampusRideError::FirebaseDatabase(msg) => write!(f, "Firebase database error: {}", msg),

            CampusRideError::IdentityProvider(msg) => write!(f, "Identity provider error: {}", msg),
            CampusRideError::FcmDelivery(msg) => write!(f, "FCM delivery error: {}", msg),
            CampusRideError::FcmInvalidToken(msg) => write!(f, "Invalid FCM token: {}", msg),

            CampusRideError::NetworkTimeout => write!(f, "Network request timed out"),
            CampusRideError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            CampusRideError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            CampusRideError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            CampusRideError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),
            CampusRideError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),

            CampusRideError::RideNotFound(id) => write!(f, "Ride not found: {}", id),
            CampusRideError::DriverNotFound(id) => write!(f, "Driver not found: {}", id),
            CampusRideError::PassengerNotFound(id) => write!(f, "Passenger not found: {}", id),
            CampusRideError::ClaimConflict(id) => {
                write!(f, "Ride {} was claimed by another driver", id)
            }
            CampusRideError::InvalidTransition { from, to } => {
                write!(f, "Invalid ride transition: {} -> {}", from, to)
            }
            CampusRideError::DriverNotOnline(id) => write!(f, "Driver {} is not online", id),
            CampusRideError::NotAssignedDriver(id) => {
                write!(f, "Driver {} is not assigned to this ride", id)
            }

            CampusRideError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            CampusRideError::MissingRequiredField(field) => {
                write!(f, "Missing required field: {}", field)
            }
            CampusRideError::InvalidFieldValue { field, value, reason } => {
                write!(f, "Invalid value '{}' for field '{}': {}", value, field, reason)
            }

            CampusRideError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CampusRideError {}

impl IntoResponse for CampusRideError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            CampusRideError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            CampusRideError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            CampusRideError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            CampusRideError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            CampusRideError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),

            CampusRideError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation errors occurred".to_string(), details)
            }
            CampusRideError::MissingRequiredField(field) => {
                (StatusCode::BAD_REQUEST, "missing_field", format!("Missing required field: {}", field), None)
            }
            CampusRideError::InvalidFieldValue { field, reason, .. } => {
                (StatusCode::BAD_REQUEST, "invalid_field", format!("Invalid value for {}: {}", field, reason), None)
            }

            CampusRideError::RideNotFound(id) => (StatusCode::NOT_FOUND, "ride_not_found", format!("Ride not found: {}", id), None),
            CampusRideError::DriverNotFound(id) => (StatusCode::NOT_FOUND, "driver_not_found", format!("Driver not found: {}", id), None),
            CampusRideError::PassengerNotFound(id) => (StatusCode::NOT_FOUND, "passenger_not_found", format!("Passenger not found: {}", id), None),

            CampusRideError::ClaimConflict(id) => {
                (StatusCode::CONFLICT, "claim_conflict", format!("Ride {} was claimed by another driver", id), None)
            }
            CampusRideError::InvalidTransition { from, to } => {
                (StatusCode::CONFLICT, "invalid_transition", format!("Invalid ride transition: {} -> {}", from, to), None)
            }
            CampusRideError::DriverNotOnline(id) => {
                (StatusCode::CONFLICT, "driver_not_online", format!("Driver {} is not online", id), None)
            }
            CampusRideError::NotAssignedDriver(id) => {
                (StatusCode::FORBIDDEN, "not_assigned_driver", format!("Driver {} is not assigned to this ride", id), None)
            }

            CampusRideError::RemoteUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "remote_unavailable", format!("Remote store unavailable, retry later: {}", msg), None)
            }
            CampusRideError::WriteIndeterminate(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "write_indeterminate", format!("Write unacknowledged, re-query ride state: {}", msg), None)
            }

            // All other errors are treated as internal server errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string(), None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type CampusRideResult<T> = Result<T, CampusRideError>;

// Conversion implementations for common error types
impl From<redis::RedisError> for CampusRideError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => CampusRideError::RedisConnection(err.to_string()),
            redis::ErrorKind::ResponseError => CampusRideError::RedisQuery(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => CampusRideError::RedisConnection("Authentication failed".to_string()),
            _ => CampusRideError::RedisQuery(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for CampusRideError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CampusRideError::NetworkTimeout
        } else if err.is_connect() {
            CampusRideError::NetworkConnection(err.to_string())
        } else {
            CampusRideError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CampusRideError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            CampusRideError::JsonParsing(err.to_string())
        } else {
            CampusRideError::JsonSerialization(err.to_string())
        }
    }
}

impl From<uuid::Error> for CampusRideError {
    fn from(err: uuid::Error) -> Self {
        CampusRideError::InvalidFormat(format!("Invalid UUID: {}", err))
    }
}

impl From<chrono::ParseError> for CampusRideError {
    fn from(err: chrono::ParseError) -> Self {
        CampusRideError::InvalidFormat(format!("Invalid date/time format: {}", err))
    }
}

// Helper functions for creating common errors
impl CampusRideError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        CampusRideError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        CampusRideError::Unauthorized(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        CampusRideError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        CampusRideError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        CampusRideError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn ride_not_found(ride_id: impl Into<String>) -> Self {
        CampusRideError::RideNotFound(ride_id.into())
    }

    pub fn driver_not_found(driver_id: impl Into<String>) -> Self {
        CampusRideError::DriverNotFound(driver_id.into())
    }

    pub fn passenger_not_found(passenger_id: impl Into<String>) -> Self {
        CampusRideError::PassengerNotFound(passenger_id.into())
    }
}
