use serde::{Deserialize, Serialize};
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;
use uom::si::f64::{ElectricCurrent, ElectricPotential};

/// One of the three physical supply outputs.
///
/// Each channel has a fixed hardware range independent of the session safety
/// limits; channel 3 is the negative rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Ch1,
    Ch2,
    Ch3,
}

impl Channel {
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::Ch1),
            2 => Some(Self::Ch2),
            3 => Some(Self::Ch3),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::Ch1 => 1,
            Self::Ch2 => 2,
            Self::Ch3 => 3,
        }
    }

    /// Lowest voltage the hardware can drive on this channel.
    pub fn voltage_floor(self) -> ElectricPotential {
        let volts = match self {
            Self::Ch1 | Self::Ch2 => 0.0,
            Self::Ch3 => -30.0,
        };
        ElectricPotential::new::<volt>(volts)
    }

    /// Highest voltage the hardware can drive on this channel.
    pub fn voltage_ceiling(self) -> ElectricPotential {
        let volts = match self {
            Self::Ch1 => 8.0,
            Self::Ch2 => 30.0,
            Self::Ch3 => 0.0,
        };
        ElectricPotential::new::<volt>(volts)
    }

    /// Hardware current ceiling for this channel.
    pub fn current_ceiling(self) -> ElectricCurrent {
        let milliamps = match self {
            Self::Ch1 => 5000.0,
            Self::Ch2 | Self::Ch3 => 2000.0,
        };
        ElectricCurrent::new::<milliampere>(milliamps)
    }

    /// Magnitude of the voltage ceiling, used when clamping the coupled
    /// voltage limit on the negative rail.
    pub fn voltage_ceiling_magnitude(self) -> f64 {
        match self {
            Self::Ch1 => 8.0,
            Self::Ch2 | Self::Ch3 => 30.0,
        }
    }
}
