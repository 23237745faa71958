use axum::Json;
use axum::http::StatusCode;
use tokio::time::{Duration, timeout};
use tracing::*;

use crate::axumstate::AxumState;
use crate::dispatch::run_batch;
use crate::http::messages::{CommandRequest, CommandResponse};

/// Upper bound on one batch. Every setpoint settles before its readback, so
/// a long sweep legitimately takes minutes; anything beyond this is a stuck
/// instrument.
const BATCH_DEADLINE: Duration = Duration::from_secs(300);

/// POST request handler accepting a batch of protocol commands and returning
/// one response per command, input order preserved.
#[axum::debug_handler]
pub async fn post_dashboard(
    state: axum::extract::State<AxumState>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, StatusCode> {
    if let Ok(serialized) = serde_json::to_string(&request) {
        info!("POST dashboard batch: {serialized}");
    }

    // The deadline also interrupts settle waits of whatever command is in
    // flight when it expires
    match timeout(BATCH_DEADLINE, run_batch(&state, &request.commands)).await {
        Ok(responses) => Ok(Json(CommandResponse { responses })),
        Err(_) => {
            error!("command batch exceeded the {BATCH_DEADLINE:?} deadline, dropping it");
            Err(StatusCode::REQUEST_TIMEOUT)
        }
    }
}
