//! Pass/fail test evaluation: drive a setpoint, let it settle, verify the
//! physical quantity through the meter and compare against inclusive bounds.
//! Continuity and resistance checks skip the drive phase and only touch the
//! meter.

use tokio::time::sleep;
use tracing::*;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;
use uom::si::electrical_resistance::ohm;
use uom::si::f64::{ElectricCurrent, ElectricPotential};

use crate::axumstate::AxumState;
use crate::dispatch::round5;
use crate::instrument::channel::Channel;
use crate::session::SafetyLimits;

pub async fn test_voltage(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    volts: f64,
    minimum: f64,
    maximum: f64,
) -> String {
    // Drive the setpoint through the supply
    {
        let mut supply = state.supply.lock().await;
        if let Err(err) = supply
            .set_voltage(limits, channel, ElectricPotential::new::<volt>(volts))
            .await
        {
            return err.to_string();
        }
    }

    // Settle, then verify through the independent meter
    sleep(state.settle).await;
    let measured = {
        let mut meter = state.meter.lock().await;
        match meter.measure_voltage().await {
            Ok(measured) => round5(measured.get::<volt>()),
            Err(err) => return err.to_string(),
        }
    };

    let passed = minimum <= measured && measured <= maximum;
    info!(
        channel = channel.number(),
        setpoint = volts,
        measured,
        passed,
        "voltage test evaluated"
    );

    if passed {
        format!("Measured voltage: {measured}V, Test Passed")
    } else {
        format!("Measured voltage: {measured}V, Test Failed")
    }
}

pub async fn test_current(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    milliamps: f64,
    minimum: f64,
    maximum: f64,
) -> String {
    {
        let mut supply = state.supply.lock().await;
        if let Err(err) = supply
            .set_current(
                limits,
                channel,
                ElectricCurrent::new::<milliampere>(milliamps),
            )
            .await
        {
            return err.to_string();
        }
    }

    sleep(state.settle).await;
    let measured = {
        let mut meter = state.meter.lock().await;
        match meter.measure_current().await {
            Ok(measured) => round5(measured.get::<milliampere>()),
            Err(err) => return err.to_string(),
        }
    };

    let passed = minimum <= measured && measured <= maximum;
    info!(
        channel = channel.number(),
        setpoint = milliamps,
        measured,
        passed,
        "current test evaluated"
    );

    if passed {
        format!("Measured current: {measured}mA, Test Passed")
    } else {
        format!("Measured current: {measured}mA, Test Failed")
    }
}

pub async fn test_continuity(state: &AxumState) -> String {
    let mut meter = state.meter.lock().await;
    match meter.continuity().await {
        Ok(true) => "Continuous, close circuit".to_string(),
        Ok(false) => "Not continuous, open circuit".to_string(),
        Err(err) => err.to_string(),
    }
}

pub async fn test_resistance(state: &AxumState) -> String {
    let mut meter = state.meter.lock().await;
    match meter.resistance().await {
        Ok(measured) => format!("Resistance: {} Ohms", round5(measured.get::<ohm>())),
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::run_batch;
    use tokio::time::Duration;

    fn owned(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn voltage_test_passes_inside_bounds() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(
            &state,
            &owned(&["MAXV 30", "MAXC 3000", "TSTV CH2, 12, 10, 15"]),
        )
        .await;

        assert!(responses[2].contains("Test Passed"), "{}", responses[2]);
        assert!(responses[2].starts_with("Measured voltage:"));
    }

    #[tokio::test]
    async fn voltage_test_fails_outside_bounds() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(
            &state,
            &owned(&["MAXV 30", "MAXC 3000", "TSTV CH2, 12, 20, 25"]),
        )
        .await;

        assert!(responses[2].contains("Test Failed"), "{}", responses[2]);
    }

    #[tokio::test]
    async fn current_test_reports_milliamps() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(
            &state,
            &owned(&["MAXV 30", "MAXC 3000", "TSTC CH2, 1000, 900, 1100"]),
        )
        .await;

        assert!(responses[2].contains("mA"), "{}", responses[2]);
        assert!(responses[2].contains("Test Passed"), "{}", responses[2]);
    }

    #[tokio::test]
    async fn continuity_needs_a_driven_output() {
        let state = AxumState::simulated(Duration::ZERO);

        let responses = run_batch(&state, &owned(&["MAXV 10", "MAXC 3000", "TSCO"])).await;
        assert_eq!(responses[2], "Not continuous, open circuit");

        let responses = run_batch(&state, &owned(&["SETV CH1, 5", "TSCO"])).await;
        assert_eq!(responses[1], "Continuous, close circuit");
    }
}
