use thiserror::Error;
use tokio::time::{Duration, sleep};
use tracing::*;
use uom::si::electric_current::{ampere, milliampere};
use uom::si::electric_potential::volt;
use uom::si::f64::{ElectricCurrent, ElectricPotential};

use crate::instrument::channel::Channel;
use crate::instrument::{ScpiTransport, TransportError};
use crate::session::{RangeError, SafetyLimits};

#[derive(Debug, Error)]
pub enum SupplyError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Multi-channel bench power supply behind a SCPI transport.
///
/// Every setpoint write couples the opposite quantity's limit first, so the
/// output can never leave the safety envelope mid-sequence, then selects the
/// channel, drives the setpoint, enables the output and reads back the
/// settled value.
pub struct PowerSupply {
    transport: Box<dyn ScpiTransport>,
    settle: Duration,
}

impl PowerSupply {
    pub fn new(transport: Box<dyn ScpiTransport>, settle: Duration) -> Self {
        PowerSupply { transport, settle }
    }

    /// Drive a voltage setpoint and return the measured readback.
    ///
    /// Fails with a `RangeError` before any transport traffic when the
    /// setpoint violates the channel range or the session envelope.
    pub async fn set_voltage(
        &mut self,
        limits: &SafetyLimits,
        channel: Channel,
        volts: ElectricPotential,
    ) -> Result<ElectricPotential, SupplyError> {
        limits.check_voltage(channel, volts)?;

        // Limit before setpoint
        let current_limit = limits.coupled_current_limit(channel);
        self.transport
            .write(&format!("CURR {}", current_limit.get::<ampere>()))
            .await?;

        self.transport
            .write(&format!("INST CH{}", channel.number()))
            .await?;
        self.transport
            .write(&format!("VOLT {}", volts.get::<volt>()))
            .await?;
        self.transport.write("OUTP ON").await?;

        sleep(self.settle).await;

        let measured = self.query_voltage(channel).await?;
        info!(
            channel = channel.number(),
            setpoint = volts.get::<volt>(),
            measured = measured.get::<volt>(),
            "voltage setpoint applied"
        );
        Ok(measured)
    }

    /// Drive a current setpoint and return the measured readback.
    pub async fn set_current(
        &mut self,
        limits: &SafetyLimits,
        channel: Channel,
        current: ElectricCurrent,
    ) -> Result<ElectricCurrent, SupplyError> {
        limits.check_current(channel, current)?;

        let voltage_limit = limits.coupled_voltage_limit(channel);
        self.transport
            .write(&format!("VOLT {}", voltage_limit.get::<volt>()))
            .await?;

        self.transport
            .write(&format!("INST CH{}", channel.number()))
            .await?;
        self.transport
            .write(&format!("CURR {}", current.get::<ampere>()))
            .await?;
        self.transport.write("OUTP ON").await?;

        sleep(self.settle).await;

        let measured = self.query_current(channel).await?;
        info!(
            channel = channel.number(),
            setpoint = current.get::<milliampere>(),
            measured = measured.get::<milliampere>(),
            "current setpoint applied"
        );
        Ok(measured)
    }

    /// Read the voltage on a channel. No bounds validation, read-only.
    pub async fn measure_voltage(
        &mut self,
        channel: Channel,
    ) -> Result<ElectricPotential, TransportError> {
        self.transport
            .write(&format!("INST CH{}", channel.number()))
            .await?;
        self.query_voltage(channel).await
    }

    /// Read the current on a channel. No bounds validation, read-only.
    pub async fn measure_current(
        &mut self,
        channel: Channel,
    ) -> Result<ElectricCurrent, TransportError> {
        self.transport
            .write(&format!("INST CH{}", channel.number()))
            .await?;
        self.query_current(channel).await
    }

    async fn query_voltage(&mut self, channel: Channel) -> Result<ElectricPotential, TransportError> {
        let reply = self
            .transport
            .query(&format!("MEAS:VOLT? CH{}", channel.number()))
            .await?;

        let volts_read = reply
            .trim()
            .parse::<f64>()
            .map_err(|_| TransportError::BadReading {
                reply: reply.clone(),
            })?;
        Ok(ElectricPotential::new::<volt>(volts_read))
    }

    async fn query_current(&mut self, channel: Channel) -> Result<ElectricCurrent, TransportError> {
        let reply = self
            .transport
            .query(&format!("MEAS:CURR? CH{}", channel.number()))
            .await?;

        // The instrument reports amps
        let amps_read = reply
            .trim()
            .parse::<f64>()
            .map_err(|_| TransportError::BadReading {
                reply: reply.clone(),
            })?;
        Ok(ElectricCurrent::new::<ampere>(amps_read))
    }
}
