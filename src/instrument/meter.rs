use tracing::*;
use uom::si::electric_current::ampere;
use uom::si::electric_potential::volt;
use uom::si::electrical_resistance::ohm;
use uom::si::f64::{ElectricCurrent, ElectricPotential, ElectricalResistance};

use crate::instrument::{ScpiTransport, TransportError};

/// Bench multimeter behind its own SCPI transport, independent of the
/// supply. Verifies what the supply claims to be driving.
pub struct Multimeter {
    transport: Box<dyn ScpiTransport>,
}

impl Multimeter {
    pub fn new(transport: Box<dyn ScpiTransport>) -> Self {
        Multimeter { transport }
    }

    pub async fn measure_voltage(&mut self) -> Result<ElectricPotential, TransportError> {
        let volts_read = self.query_reading(":MEAS:VOLT:DC?").await?;
        info!("Measured voltage: {volts_read}V");
        Ok(ElectricPotential::new::<volt>(volts_read))
    }

    pub async fn measure_current(&mut self) -> Result<ElectricCurrent, TransportError> {
        // The meter reports amps
        let amps_read = self.query_reading(":MEAS:CURR:DC?").await?;
        info!("Measured current: {}mA", amps_read * 1000.0);
        Ok(ElectricCurrent::new::<ampere>(amps_read))
    }

    /// Continuity check across the probes; `true` means a closed circuit.
    pub async fn continuity(&mut self) -> Result<bool, TransportError> {
        let reply = self.transport.query(":MEAS:CONT?").await?;
        Ok(reply.trim() == "1")
    }

    pub async fn resistance(&mut self) -> Result<ElectricalResistance, TransportError> {
        let ohms_read = self.query_reading(":MEAS:RES?").await?;
        info!("Measured resistance: {ohms_read} Ohms");
        Ok(ElectricalResistance::new::<ohm>(ohms_read))
    }

    async fn query_reading(&mut self, command: &str) -> Result<f64, TransportError> {
        let reply = self.transport.query(command).await?;
        reply
            .trim()
            .parse::<f64>()
            .map_err(|_| TransportError::BadReading {
                reply: reply.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingTransport;
    use uom::si::electric_current::milliampere;

    #[tokio::test]
    async fn current_readings_convert_to_milliamps() {
        let (transport, _log) = RecordingTransport::new("0.123");
        let mut meter = Multimeter::new(Box::new(transport));

        let measured = meter.measure_current().await.unwrap();
        assert!((measured.get::<milliampere>() - 123.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn continuity_reply_maps_to_closed_circuit() {
        let (transport, _log) = RecordingTransport::new("1");
        let mut meter = Multimeter::new(Box::new(transport));
        assert!(meter.continuity().await.unwrap());

        let (transport, _log) = RecordingTransport::new("0");
        let mut meter = Multimeter::new(Box::new(transport));
        assert!(!meter.continuity().await.unwrap());
    }
}
