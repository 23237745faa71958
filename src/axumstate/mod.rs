use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as InstrumentMutex;
use tokio::time::Duration;

use crate::instrument::meter::Multimeter;
use crate::instrument::supply::PowerSupply;
use crate::session::SafetyLimits;

/// All shared state involved in http command handling
#[derive(Clone)]
pub struct AxumState {
    /// Safety envelope of the active session
    pub limits: Arc<Mutex<SafetyLimits>>,

    /// Long-lived power supply handle; the async mutex serialises all
    /// instrument exchanges, also across concurrent batches
    pub supply: Arc<InstrumentMutex<PowerSupply>>,

    /// Long-lived multimeter handle, an independent physical instrument
    pub meter: Arc<InstrumentMutex<Multimeter>>,

    /// Wait between driving a setpoint and trusting a meter reading
    pub settle: Duration,
}

impl AxumState {
    pub fn new(supply: PowerSupply, meter: Multimeter, settle: Duration) -> Self {
        AxumState {
            limits: Arc::new(Mutex::new(SafetyLimits::default())),
            supply: Arc::new(InstrumentMutex::new(supply)),
            meter: Arc::new(InstrumentMutex::new(meter)),
            settle,
        }
    }

    /// State backed by the simulated bench, no hardware required.
    #[cfg(any(feature = "sim", test))]
    pub fn simulated(settle: Duration) -> Self {
        let (supply_transport, meter_transport) = crate::instrument::sim::sim_bench();
        AxumState::new(
            PowerSupply::new(Box::new(supply_transport), settle),
            Multimeter::new(Box::new(meter_transport)),
            settle,
        )
    }
}
