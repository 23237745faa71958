use axum::Json;
use axum::http::StatusCode;
use tracing::*;

use crate::axumstate::AxumState;
use crate::http::messages::{HeartbeatMessage, LimitsMessage};

/// Return a heartbeat message
#[axum::debug_handler]
pub async fn get_heartbeat(_state: axum::extract::State<AxumState>) -> Json<HeartbeatMessage> {
    Json(HeartbeatMessage::new())
}

/// Return the current safety envelope of the session
#[axum::debug_handler]
pub async fn get_limits(
    state: axum::extract::State<AxumState>,
) -> Result<Json<LimitsMessage>, StatusCode> {
    if let Ok(limits) = state.limits.lock() {
        return Ok(Json(LimitsMessage::from(&*limits)));
    }

    // Unable to lock mutex, or mutex was poisoned
    error!("unable to lock the limits mutex during GET limits - Returning INTERNAL_SERVER_ERROR");
    Err(StatusCode::INTERNAL_SERVER_ERROR)
}
