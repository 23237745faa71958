use std::env;

use tokio::time::Duration;
use tracing::*;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_SUPPLY_RESOURCE: &str = "10.0.0.11:5025";
const DEFAULT_METER_RESOURCE: &str = "10.0.0.12:5025";
const DEFAULT_SETTLE_MS: u64 = 1000;

/// Runtime configuration, sourced from the environment with bench defaults.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub listen_addr: String,

    /// SCPI socket of the power supply
    pub supply_resource: String,

    /// SCPI socket of the multimeter
    pub meter_resource: String,

    /// Wait after a setpoint write before a reading is considered valid
    pub settle: Duration,
}

impl BenchConfig {
    pub fn from_env() -> Self {
        let settle_ms = match env::var("BENCH_SETTLE_MS") {
            Ok(raw) => raw.parse::<u64>().unwrap_or_else(|err| {
                warn!("ignoring unparseable BENCH_SETTLE_MS '{raw}': {err}");
                DEFAULT_SETTLE_MS
            }),
            Err(_) => DEFAULT_SETTLE_MS,
        };

        BenchConfig {
            listen_addr: env::var("BENCH_LISTEN_ADDR")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            supply_resource: env::var("BENCH_SUPPLY_RESOURCE")
                .unwrap_or_else(|_| DEFAULT_SUPPLY_RESOURCE.to_string()),
            meter_resource: env::var("BENCH_METER_RESOURCE")
                .unwrap_or_else(|_| DEFAULT_METER_RESOURCE.to_string()),
            settle: Duration::from_millis(settle_ms),
        }
    }
}
