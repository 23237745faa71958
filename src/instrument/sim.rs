use std::sync::{Arc, Mutex};

use rand::random_range;
use tracing::*;

use crate::instrument::{ScpiTransport, TransportError};

/// State shared between the simulated supply and meter: the meter probes
/// whatever the supply is currently driving, like the real bench wiring.
#[derive(Debug)]
struct BenchState {
    /// Currently selected output, 1-based
    selected: usize,
    volts: [f64; 3],
    amps: [f64; 3],
    output_on: bool,
}

impl Default for BenchState {
    fn default() -> Self {
        BenchState {
            selected: 1,
            volts: [0.0; 3],
            amps: [0.0; 3],
            output_on: false,
        }
    }
}

impl BenchState {
    fn channel_index(&self, number: usize) -> usize {
        number.clamp(1, 3) - 1
    }

    fn apply(&mut self, command: &str) {
        if let Some(rest) = command.strip_prefix("INST CH") {
            self.selected = rest.trim().parse().unwrap_or(self.selected).clamp(1, 3);
        } else if let Some(rest) = command.strip_prefix("VOLT ") {
            self.volts[self.selected - 1] = rest.trim().parse().unwrap_or(0.0);
        } else if let Some(rest) = command.strip_prefix("CURR ") {
            self.amps[self.selected - 1] = rest.trim().parse().unwrap_or(0.0);
        } else if command == "OUTP ON" {
            self.output_on = true;
        } else if command == "OUTP OFF" {
            self.output_on = false;
        }
    }
}

/// Multiply a nominal reading by a small gain error so simulated readbacks
/// never come back bit-exact.
fn jitter(value: f64) -> f64 {
    value * random_range(0.9975..=1.0025)
}

/// Build the simulated bench: one supply and one meter wired to the same
/// state. No hardware required, used by the default `sim` feature and tests.
pub fn sim_bench() -> (SimSupplyTransport, SimMeterTransport) {
    let bench = Arc::new(Mutex::new(BenchState::default()));
    (
        SimSupplyTransport {
            bench: bench.clone(),
        },
        SimMeterTransport { bench },
    )
}

pub struct SimSupplyTransport {
    bench: Arc<Mutex<BenchState>>,
}

#[async_trait::async_trait]
impl ScpiTransport for SimSupplyTransport {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        debug!("Simulated supply received command: {command}");
        if let Ok(mut bench) = self.bench.lock() {
            bench.apply(command);
        }
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        let bench = match self.bench.lock() {
            Ok(bench) => bench,
            Err(_) => return Ok("0.0".to_string()),
        };

        let reply = if let Some(rest) = command.strip_prefix("MEAS:VOLT? CH") {
            let index = bench.channel_index(rest.trim().parse().unwrap_or(bench.selected));
            let nominal = if bench.output_on { bench.volts[index] } else { 0.0 };
            format!("{:.5}", jitter(nominal))
        } else if let Some(rest) = command.strip_prefix("MEAS:CURR? CH") {
            let index = bench.channel_index(rest.trim().parse().unwrap_or(bench.selected));
            let nominal = if bench.output_on { bench.amps[index] } else { 0.0 };
            format!("{:.5}", jitter(nominal))
        } else {
            "0.0".to_string()
        };

        debug!("Simulated supply answered '{command}' with '{reply}'");
        Ok(reply)
    }
}

pub struct SimMeterTransport {
    bench: Arc<Mutex<BenchState>>,
}

#[async_trait::async_trait]
impl ScpiTransport for SimMeterTransport {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        debug!("Simulated meter received command: {command}");
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        let bench = match self.bench.lock() {
            Ok(bench) => bench,
            Err(_) => return Ok("0.0".to_string()),
        };

        let probed = bench.selected - 1;
        let reply = match command {
            ":MEAS:VOLT:DC?" => {
                let nominal = if bench.output_on { bench.volts[probed] } else { 0.0 };
                format!("{:.5}", jitter(nominal))
            }
            ":MEAS:CURR:DC?" => {
                let nominal = if bench.output_on { bench.amps[probed] } else { 0.0 };
                format!("{:.5}", jitter(nominal))
            }
            // Continuity through the device under test needs a driven output
            ":MEAS:CONT?" => {
                if bench.output_on {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            ":MEAS:RES?" => format!("{:.5}", random_range(995.0..=1005.0)),
            _ => "0.0".to_string(),
        };

        debug!("Simulated meter answered '{command}' with '{reply}'");
        Ok(reply)
    }
}
