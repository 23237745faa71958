//! Command dispatcher: parses each line of a batch, routes it to the right
//! component and collects exactly one response string per line, in input
//! order. Every failure is rendered into its response slot; nothing aborts
//! the rest of the batch.

pub mod sweep;
pub mod tester;

use tracing::*;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;
use uom::si::f64::{ElectricCurrent, ElectricPotential};
use uuid::Uuid;

use crate::axumstate::AxumState;
use crate::command::{self, Command};

/// Fixed guidance returned for any instrument command issued before the
/// safety envelope is configured.
pub const NOT_CONFIGURED_GUIDANCE: &str =
    "use MAXV to set max voltage and MAXC to set max current";

/// Round a reading to 5 decimals for display.
pub(crate) fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Process a batch of command lines strictly in order.
pub async fn run_batch(state: &AxumState, commands: &[String]) -> Vec<String> {
    let batch_id = Uuid::new_v4();
    info!(%batch_id, len = commands.len(), "processing command batch");

    let mut responses = Vec::with_capacity(commands.len());
    for line in commands {
        let response = run_command(state, line).await;
        debug!(%batch_id, line = %line, response = %response, "command processed");
        responses.push(response);
    }
    responses
}

async fn run_command(state: &AxumState, line: &str) -> String {
    let command = match command::parse(line) {
        Ok(command) => command,
        Err(err) => {
            warn!("failed to parse command '{line}': {err}");
            return err.to_string();
        }
    };

    // Snapshot the envelope up front: instrument operations hold the
    // instrument mutex across awaits, so the std mutex cannot stay locked.
    let limits = match state.limits.lock() {
        Ok(limits) => limits.clone(),
        Err(_) => return poisoned_limits_response(),
    };

    if command.requires_configured_limits() && !limits.is_configured() {
        return NOT_CONFIGURED_GUIDANCE.to_string();
    }

    match command {
        Command::SetMaxVoltage { volts } => match state.limits.lock() {
            Ok(mut limits) => {
                let rating = limits.set_max_voltage(ElectricPotential::new::<volt>(volts));
                info!("session max voltage set to {}V", rating.get::<volt>());
                format!("Voltage Rating: {}", rating.get::<volt>())
            }
            Err(_) => poisoned_limits_response(),
        },

        Command::SetMaxCurrent { milliamps } => match state.limits.lock() {
            Ok(mut limits) => {
                let rating =
                    limits.set_max_current(ElectricCurrent::new::<milliampere>(milliamps));
                info!("session max current set to {}mA", rating.get::<milliampere>());
                format!("Current Rating: {}", rating.get::<milliampere>())
            }
            Err(_) => poisoned_limits_response(),
        },

        Command::SetVoltage { channel, volts } => {
            let mut supply = state.supply.lock().await;
            match supply
                .set_voltage(&limits, channel, ElectricPotential::new::<volt>(volts))
                .await
            {
                Ok(measured) => format!(
                    "Channel {} Voltage set to {}",
                    channel.number(),
                    round5(measured.get::<volt>())
                ),
                Err(err) => err.to_string(),
            }
        }

        Command::SetCurrent { channel, milliamps } => {
            let mut supply = state.supply.lock().await;
            match supply
                .set_current(
                    &limits,
                    channel,
                    ElectricCurrent::new::<milliampere>(milliamps),
                )
                .await
            {
                Ok(measured) => format!(
                    "Channel {} Current set to {}mA",
                    channel.number(),
                    round5(measured.get::<milliampere>())
                ),
                Err(err) => err.to_string(),
            }
        }

        Command::GetVoltage { channel } => {
            let mut supply = state.supply.lock().await;
            match supply.measure_voltage(channel).await {
                Ok(measured) => format!(
                    "Voltage at channel {}: {}",
                    channel.number(),
                    round5(measured.get::<volt>())
                ),
                Err(err) => err.to_string(),
            }
        }

        Command::GetCurrent { channel } => {
            let mut supply = state.supply.lock().await;
            match supply.measure_current(channel).await {
                Ok(measured) => format!(
                    "Current at channel {}: {}",
                    channel.number(),
                    round5(measured.get::<milliampere>())
                ),
                Err(err) => err.to_string(),
            }
        }

        Command::TestVoltage {
            channel,
            volts,
            minimum,
            maximum,
        } => tester::test_voltage(state, &limits, channel, volts, minimum, maximum).await,

        Command::TestCurrent {
            channel,
            milliamps,
            minimum,
            maximum,
        } => tester::test_current(state, &limits, channel, milliamps, minimum, maximum).await,

        Command::TestContinuity => tester::test_continuity(state).await,

        Command::TestResistance => tester::test_resistance(state).await,

        Command::SweepVoltage {
            channel,
            start,
            end,
            step,
        } => sweep::sweep_voltage(state, &limits, channel, start, end, step).await,

        Command::SweepCurrent {
            channel,
            start,
            end,
            step,
        } => sweep::sweep_current(state, &limits, channel, start, end, step).await,
    }
}

fn poisoned_limits_response() -> String {
    error!("unable to lock the safety limits mutex, mutex poisoned");
    "Error: session limits unavailable".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    fn owned(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn instrument_commands_are_guarded_until_ratings_are_set() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(
            &state,
            &owned(&["SETV CH1, 5", "GETC 2", "TSCO", "PRBV CH1, 0, 5, 1"]),
        )
        .await;

        assert_eq!(responses.len(), 4);
        for response in &responses {
            assert_eq!(response, NOT_CONFIGURED_GUIDANCE);
        }
    }

    #[tokio::test]
    async fn resistance_reading_skips_the_guard() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(&state, &owned(&["TSTR"])).await;
        assert!(responses[0].starts_with("Resistance:"), "{}", responses[0]);
    }

    #[tokio::test]
    async fn batch_preserves_order_and_length() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(
            &state,
            &owned(&["MAXV 10", "MAXC 3000", "BOGUS", "SETV CH1, 5", "GETV 1"]),
        )
        .await;

        assert_eq!(responses.len(), 5);
        assert_eq!(responses[0], "Voltage Rating: 10");
        assert_eq!(responses[1], "Current Rating: 3000");
        assert!(responses[2].contains("command not found"), "{}", responses[2]);
        assert!(
            responses[3].starts_with("Channel 1 Voltage set to"),
            "{}",
            responses[3]
        );
        assert!(
            responses[4].starts_with("Voltage at channel 1:"),
            "{}",
            responses[4]
        );
    }

    #[tokio::test]
    async fn out_of_range_setpoint_is_reported_in_place() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses =
            run_batch(&state, &owned(&["MAXV 10", "MAXC 3000", "SETV CH1, 9"])).await;

        assert_eq!(
            responses[2],
            "Voltage must be set between 0V and 8V for channel 1."
        );
    }

    #[tokio::test]
    async fn ratings_can_be_overwritten_later() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(&state, &owned(&["MAXV 10", "MAXV 12.5"])).await;
        assert_eq!(responses[1], "Voltage Rating: 12.5");
    }
}
