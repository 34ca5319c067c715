//! Measurement snapshot of one monitored supply rail.
//!
//! A [`Channel`] keeps the last good bus voltage, current and power of one
//! INA226 and integrates power over time into consumed energy. A failed read
//! leaves the previous value of that quantity in place.

use embedded_hal::delay::DelayNs;

use crate::alert::AlertHandler;
use crate::driver::Ina226;
use crate::error::Error;
use crate::interface::{DebugPrint, Interface};

const MS_PER_HOUR: f32 = 3_600_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    voltage_mv: f32,
    current_ma: f32,
    power_mw: f32,
    energy_mwh: f32,
}

impl Channel {
    pub const fn new() -> Self {
        Channel {
            voltage_mv: 0.0,
            current_ma: 0.0,
            power_mw: 0.0,
            energy_mwh: 0.0,
        }
    }

    /// Read bus voltage, current and power from `ina` and add the energy
    /// drawn over the last `dt_ms` milliseconds.
    ///
    /// All three reads are attempted. In a triggered mode only the first one
    /// waits for the conversion. Energy is only accumulated when the power
    /// read succeeds. Returns the first error seen.
    pub fn update<IF, D, P, A>(
        &mut self,
        ina: &mut Ina226<IF, D, P, A>,
        dt_ms: u32,
    ) -> Result<(), Error>
    where
        IF: Interface,
        D: DelayNs,
        P: DebugPrint,
        A: AlertHandler,
    {
        let bus = ina.read_bus_voltage();
        if let Ok(reading) = bus {
            self.voltage_mv = reading.value;
        }

        let current = ina.read_current();
        if let Ok(reading) = current {
            self.current_ma = reading.value;
        }

        let power = ina.read_power();
        if let Ok(reading) = power {
            self.power_mw = reading.value;
            self.energy_mwh += self.power_mw * dt_ms as f32 / MS_PER_HOUR;
        }

        bus.and(current).and(power).map(|_| ())
    }

    pub fn voltage_mv(&self) -> f32 {
        self.voltage_mv
    }

    pub fn current_ma(&self) -> f32 {
        self.current_ma
    }

    pub fn power_mw(&self) -> f32 {
        self.power_mw
    }

    /// Energy accumulated since creation or the last `reset_energy`.
    pub fn energy_mwh(&self) -> f32 {
        self.energy_mwh
    }

    pub fn reset_energy(&mut self) {
        self.energy_mwh = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{Mode, Register};
    use crate::sim::*;
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;

    fn calibrated(device: SimDevice) -> Fixture {
        let mut fixture = initialized(device);
        let code = fixture.ina.calculate_calibration().unwrap();
        fixture.ina.set_calibration(code).unwrap();
        let device = sim_mut(&mut fixture.ina);
        device.set(Register::BusVoltage, 9600);
        device.set(Register::Current, 1600);
        device.set(Register::Power, 800);
        fixture
    }

    #[test]
    fn update_snapshots_and_integrates_energy() {
        let mut fixture = calibrated(SimDevice::new());
        let mut channel = Channel::new();

        channel.update(&mut fixture.ina, 360_000).unwrap();
        assert!(approx_eq!(f32, channel.voltage_mv(), 12_000.0, ulps = 2));
        assert!(approx_eq!(f32, channel.current_ma(), 1000.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, channel.power_mw(), 12_500.0, epsilon = 1e-2));
        assert!(approx_eq!(f32, channel.energy_mwh(), 1250.0, epsilon = 1e-2));

        channel.update(&mut fixture.ina, 360_000).unwrap();
        assert!(approx_eq!(f32, channel.energy_mwh(), 2500.0, epsilon = 1e-2));

        channel.reset_energy();
        assert_eq!(channel.energy_mwh(), 0.0);
        assert!(approx_eq!(f32, channel.power_mw(), 12_500.0, epsilon = 1e-2));
    }

    #[test]
    fn only_first_read_waits_for_triggered_conversion() {
        let mut fixture = calibrated(SimDevice::new());
        fixture.ina.set_mode(Mode::ShuntAndBusTriggered).unwrap();
        sim_mut(&mut fixture.ina).ready_after = Some(3);

        let mut channel = Channel::new();
        channel.update(&mut fixture.ina, 1000).unwrap();

        assert!(!fixture.ina.trigger_pending());
        assert_eq!(sim(&fixture.ina).mask_reads, 3 + 1 + 1);
        assert_eq!(fixture.delay.calls.get(), 1 + 1);
    }

    #[test]
    fn failed_read_keeps_last_good_value() {
        let mut fixture = calibrated(SimDevice::new());
        let mut channel = Channel::new();
        channel.update(&mut fixture.ina, 360_000).unwrap();

        let device = sim_mut(&mut fixture.ina);
        device.set(Register::BusVoltage, 4000);
        device.set(Register::Current, 800);
        device.fail_reads_of(Register::Current, 0);

        assert_eq!(channel.update(&mut fixture.ina, 360_000), Err(Error::Transport));
        assert!(approx_eq!(f32, channel.voltage_mv(), 5000.0, ulps = 2));
        assert!(approx_eq!(f32, channel.current_ma(), 1000.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, channel.energy_mwh(), 2500.0, epsilon = 1e-2));
    }

    #[test]
    fn failed_power_read_adds_no_energy() {
        let mut fixture = calibrated(SimDevice::new());
        let mut channel = Channel::new();
        channel.update(&mut fixture.ina, 360_000).unwrap();

        sim_mut(&mut fixture.ina).fail_reads_of(Register::Power, 0);
        assert_eq!(channel.update(&mut fixture.ina, 360_000), Err(Error::Transport));
        assert!(approx_eq!(f32, channel.energy_mwh(), 1250.0, epsilon = 1e-2));
    }

    #[test]
    fn update_needs_initialized_device() {
        let mut fixture = linked(SimDevice::new());
        let mut channel = Channel::new();

        assert_eq!(channel.update(&mut fixture.ina, 1000), Err(Error::NotInitialized));
        assert_eq!(channel, Channel::default());
    }
}
