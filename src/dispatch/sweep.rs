//! Stepped voltage/current sweeps: characterize a channel across a range by
//! driving successive setpoints and recording the meter reading at each one.
//! Sweeps log their samples, they do not pass/fail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::*;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;
use uom::si::f64::{ElectricCurrent, ElectricPotential};

use crate::axumstate::AxumState;
use crate::dispatch::round5;
use crate::instrument::channel::Channel;
use crate::instrument::meter::Multimeter;
use crate::instrument::supply::{PowerSupply, SupplyError};
use crate::session::SafetyLimits;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    /// A zero step would never terminate; a negative one never reaches `end`.
    #[error("Sweep step must be greater than zero.")]
    NonPositiveStep,
}

/// One recorded point of a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSample {
    pub setpoint: f64,
    pub measured: f64,
    pub at: DateTime<Utc>,
}

pub async fn sweep_voltage(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    start: f64,
    end: f64,
    step: f64,
) -> String {
    if step <= 0.0 {
        return SweepError::NonPositiveStep.to_string();
    }
    // Both bounds must hold before the first setpoint is driven
    for bound in [start, end] {
        if let Err(err) = limits.check_voltage(channel, ElectricPotential::new::<volt>(bound)) {
            return err.to_string();
        }
    }

    match run_voltage_sweep(state, limits, channel, start, end, step).await {
        Ok(samples) => {
            info!(
                channel = channel.number(),
                points = samples.len(),
                "voltage sweep complete"
            );
            format!(
                "Voltage sweep of channel {} complete: {} points from {}V to {}V",
                channel.number(),
                samples.len(),
                start,
                end
            )
        }
        Err(err) => err.to_string(),
    }
}

pub async fn sweep_current(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    start: f64,
    end: f64,
    step: f64,
) -> String {
    if step <= 0.0 {
        return SweepError::NonPositiveStep.to_string();
    }
    for bound in [start, end] {
        if let Err(err) =
            limits.check_current(channel, ElectricCurrent::new::<milliampere>(bound))
        {
            return err.to_string();
        }
    }

    match run_current_sweep(state, limits, channel, start, end, step).await {
        Ok(samples) => {
            info!(
                channel = channel.number(),
                points = samples.len(),
                "current sweep complete"
            );
            format!(
                "Current sweep of channel {} complete: {} points from {}mA to {}mA",
                channel.number(),
                samples.len(),
                start,
                end
            )
        }
        Err(err) => err.to_string(),
    }
}

async fn run_voltage_sweep(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    start: f64,
    end: f64,
    step: f64,
) -> Result<Vec<SweepSample>, SupplyError> {
    let mut supply = state.supply.lock().await;
    let mut meter = state.meter.lock().await;

    let mut samples = Vec::new();
    let mut setpoint = start;
    while setpoint <= end {
        samples.push(sample_voltage(&mut supply, &mut meter, limits, channel, setpoint).await?);
        setpoint += step;
    }

    // Step accumulation can overshoot `end`; the end boundary is always the
    // last sample.
    samples.push(sample_voltage(&mut supply, &mut meter, limits, channel, end).await?);
    Ok(samples)
}

async fn run_current_sweep(
    state: &AxumState,
    limits: &SafetyLimits,
    channel: Channel,
    start: f64,
    end: f64,
    step: f64,
) -> Result<Vec<SweepSample>, SupplyError> {
    let mut supply = state.supply.lock().await;
    let mut meter = state.meter.lock().await;

    let mut samples = Vec::new();
    let mut setpoint = start;
    while setpoint <= end {
        samples.push(sample_current(&mut supply, &mut meter, limits, channel, setpoint).await?);
        setpoint += step;
    }

    samples.push(sample_current(&mut supply, &mut meter, limits, channel, end).await?);
    Ok(samples)
}

async fn sample_voltage(
    supply: &mut PowerSupply,
    meter: &mut Multimeter,
    limits: &SafetyLimits,
    channel: Channel,
    setpoint: f64,
) -> Result<SweepSample, SupplyError> {
    supply
        .set_voltage(limits, channel, ElectricPotential::new::<volt>(setpoint))
        .await?;
    let measured = round5(meter.measure_voltage().await?.get::<volt>());

    info!(channel = channel.number(), setpoint, measured, "voltage sweep point");
    Ok(SweepSample {
        setpoint,
        measured,
        at: Utc::now(),
    })
}

async fn sample_current(
    supply: &mut PowerSupply,
    meter: &mut Multimeter,
    limits: &SafetyLimits,
    channel: Channel,
    setpoint: f64,
) -> Result<SweepSample, SupplyError> {
    supply
        .set_current(
            limits,
            channel,
            ElectricCurrent::new::<milliampere>(setpoint),
        )
        .await?;
    let measured = round5(meter.measure_current().await?.get::<milliampere>());

    info!(channel = channel.number(), setpoint, measured, "current sweep point");
    Ok(SweepSample {
        setpoint,
        measured,
        at: Utc::now(),
    })
}
