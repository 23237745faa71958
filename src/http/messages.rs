use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;

use crate::session::SafetyLimits;

/// Batch of protocol commands submitted by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub commands: Vec<String>,
}

/// One response per submitted command, input order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub responses: Vec<String>,
}

/// Return a heartbeat message
#[derive(Serialize)]
pub struct HeartbeatMessage {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

impl HeartbeatMessage {
    pub fn new() -> Self {
        Self {
            status: "alive",
            timestamp: Utc::now(),
        }
    }
}

impl Default for HeartbeatMessage {
    fn default() -> Self {
        Self::new()
    }
}

/// Envelope snapshot exposed over http; values are null until the matching
/// rating command has been issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsMessage {
    pub max_voltage: Option<f64>,
    pub max_current_ma: Option<f64>,
}

impl From<&SafetyLimits> for LimitsMessage {
    fn from(limits: &SafetyLimits) -> Self {
        Self {
            max_voltage: limits.max_voltage().map(|rating| rating.get::<volt>()),
            max_current_ma: limits
                .max_current()
                .map(|rating| rating.get::<milliampere>()),
        }
    }
}
