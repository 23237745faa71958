use thiserror::Error;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::volt;
use uom::si::f64::{ElectricCurrent, ElectricPotential};

use crate::instrument::channel::Channel;

/// A requested setpoint fell outside the channel hardware range or the
/// session safety envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("Voltage cannot be greater than the voltage rating of the circuit.")]
    VoltageAboveRating,

    #[error("Voltage must be set between {floor}V and {ceiling}V for channel {channel}.")]
    VoltageOutsideChannel { channel: u8, floor: f64, ceiling: f64 },

    #[error("Current cannot be greater than the current rating of the circuit.")]
    CurrentAboveRating,

    #[error("Current must be set between {floor}mA and {ceiling}mA for channel {channel}.")]
    CurrentOutsideChannel { channel: u8, floor: f64, ceiling: f64 },
}

/// Safety envelope of the active session: the rating of the board under
/// test, tighter than (or equal to) any channel's hardware range.
///
/// One scalar pair per session, set by MAXV/MAXC and never reset. Both values
/// must be present before any instrument command is accepted.
#[derive(Debug, Clone, Default)]
pub struct SafetyLimits {
    max_voltage: Option<ElectricPotential>,
    max_current: Option<ElectricCurrent>,
}

impl SafetyLimits {
    /// Unconditionally overwrite the session max voltage, returning the new
    /// rating for the confirmation response.
    pub fn set_max_voltage(&mut self, volts: ElectricPotential) -> ElectricPotential {
        self.max_voltage = Some(volts);
        volts
    }

    /// Unconditionally overwrite the session max current, returning the new
    /// rating for the confirmation response.
    pub fn set_max_current(&mut self, current: ElectricCurrent) -> ElectricCurrent {
        self.max_current = Some(current);
        current
    }

    pub fn max_voltage(&self) -> Option<ElectricPotential> {
        self.max_voltage
    }

    pub fn max_current(&self) -> Option<ElectricCurrent> {
        self.max_current
    }

    /// True once both MAXV and MAXC have been issued.
    pub fn is_configured(&self) -> bool {
        self.max_voltage.is_some() && self.max_current.is_some()
    }

    /// Validate a voltage setpoint against the envelope and the channel
    /// hardware range.
    pub fn check_voltage(
        &self,
        channel: Channel,
        volts: ElectricPotential,
    ) -> Result<(), RangeError> {
        if let Some(max) = self.max_voltage {
            if volts > max {
                return Err(RangeError::VoltageAboveRating);
            }
        }

        let floor = channel.voltage_floor();
        let ceiling = channel.voltage_ceiling();
        if volts < floor || volts > ceiling {
            return Err(RangeError::VoltageOutsideChannel {
                channel: channel.number(),
                floor: floor.get::<volt>(),
                ceiling: ceiling.get::<volt>(),
            });
        }

        Ok(())
    }

    /// Validate a current setpoint against the envelope and the channel
    /// hardware range.
    pub fn check_current(
        &self,
        channel: Channel,
        current: ElectricCurrent,
    ) -> Result<(), RangeError> {
        if let Some(max) = self.max_current {
            if current > max {
                return Err(RangeError::CurrentAboveRating);
            }
        }

        let floor = ElectricCurrent::new::<milliampere>(0.0);
        let ceiling = channel.current_ceiling();
        if current < floor || current > ceiling {
            return Err(RangeError::CurrentOutsideChannel {
                channel: channel.number(),
                floor: 0.0,
                ceiling: ceiling.get::<milliampere>(),
            });
        }

        Ok(())
    }

    /// Current limit asserted alongside every voltage setpoint: the session
    /// rating clamped to the channel hardware ceiling.
    pub fn coupled_current_limit(&self, channel: Channel) -> ElectricCurrent {
        let ceiling = channel.current_ceiling();
        match self.max_current {
            Some(max) if max < ceiling => max,
            _ => ceiling,
        }
    }

    /// Voltage limit asserted alongside every current setpoint, clamped to
    /// the channel ceiling. Channel 3 only drives negative voltages, so its
    /// limit is the clamped magnitude on the negative rail.
    pub fn coupled_voltage_limit(&self, channel: Channel) -> ElectricPotential {
        let ceiling = channel.voltage_ceiling_magnitude();
        let magnitude = match self.max_voltage {
            Some(max) => max.get::<volt>().abs().min(ceiling),
            None => ceiling,
        };

        let volts = match channel {
            Channel::Ch3 => -magnitude,
            _ => magnitude,
        };
        ElectricPotential::new::<volt>(volts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volts(value: f64) -> ElectricPotential {
        ElectricPotential::new::<volt>(value)
    }

    fn milliamps(value: f64) -> ElectricCurrent {
        ElectricCurrent::new::<milliampere>(value)
    }

    fn configured(max_v: f64, max_ma: f64) -> SafetyLimits {
        let mut limits = SafetyLimits::default();
        limits.set_max_voltage(volts(max_v));
        limits.set_max_current(milliamps(max_ma));
        limits
    }

    #[test]
    fn configured_only_after_both_ratings() {
        let mut limits = SafetyLimits::default();
        assert!(!limits.is_configured());

        limits.set_max_voltage(volts(10.0));
        assert!(!limits.is_configured());

        limits.set_max_current(milliamps(3000.0));
        assert!(limits.is_configured());
    }

    #[test]
    fn envelope_caps_channel_range() {
        let limits = configured(5.0, 3000.0);

        assert!(limits.check_voltage(Channel::Ch1, volts(5.0)).is_ok());
        assert_eq!(
            limits.check_voltage(Channel::Ch1, volts(6.0)),
            Err(RangeError::VoltageAboveRating)
        );
    }

    #[test]
    fn channel_range_caps_generous_envelope() {
        let limits = configured(100.0, 3000.0);

        assert_eq!(
            limits.check_voltage(Channel::Ch1, volts(9.0)),
            Err(RangeError::VoltageOutsideChannel {
                channel: 1,
                floor: 0.0,
                ceiling: 8.0
            })
        );
        assert!(limits.check_voltage(Channel::Ch2, volts(9.0)).is_ok());
    }

    #[test]
    fn negative_rail_accepts_negative_setpoints_only() {
        let limits = configured(10.0, 2000.0);

        assert!(limits.check_voltage(Channel::Ch3, volts(-12.0)).is_ok());
        assert_eq!(
            limits.check_voltage(Channel::Ch3, volts(1.0)),
            Err(RangeError::VoltageOutsideChannel {
                channel: 3,
                floor: -30.0,
                ceiling: 0.0
            })
        );
    }

    #[test]
    fn current_checks_mirror_voltage_checks() {
        let limits = configured(10.0, 3000.0);

        assert!(limits.check_current(Channel::Ch1, milliamps(3000.0)).is_ok());
        assert_eq!(
            limits.check_current(Channel::Ch1, milliamps(3500.0)),
            Err(RangeError::CurrentAboveRating)
        );
        assert!(matches!(
            limits.check_current(Channel::Ch2, milliamps(-1.0)),
            Err(RangeError::CurrentOutsideChannel { channel: 2, .. })
        ));
    }

    #[test]
    fn coupled_current_limit_takes_the_tighter_bound() {
        let session_bound = configured(10.0, 3000.0);
        let limit = session_bound.coupled_current_limit(Channel::Ch1);
        assert!((limit.get::<milliampere>() - 3000.0).abs() < 1e-9);

        let hardware_bound = configured(10.0, 6000.0);
        let limit = hardware_bound.coupled_current_limit(Channel::Ch1);
        assert!((limit.get::<milliampere>() - 5000.0).abs() < 1e-9);
        let limit = hardware_bound.coupled_current_limit(Channel::Ch2);
        assert!((limit.get::<milliampere>() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn coupled_voltage_limit_respects_the_negative_rail() {
        let limits = configured(10.0, 3000.0);
        assert_eq!(limits.coupled_voltage_limit(Channel::Ch2).get::<volt>(), 10.0);
        assert_eq!(limits.coupled_voltage_limit(Channel::Ch3).get::<volt>(), -10.0);
        assert_eq!(limits.coupled_voltage_limit(Channel::Ch1).get::<volt>(), 8.0);

        let generous = configured(50.0, 3000.0);
        assert_eq!(generous.coupled_voltage_limit(Channel::Ch3).get::<volt>(), -30.0);
    }
}
