use crate::register::{Average, ConversionTime, Mode};

/// Bring-up settings applied by [`Ina226::configure`](crate::Ina226::configure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub average: Average,
    pub bus_conversion_time: ConversionTime,
    pub shunt_conversion_time: ConversionTime,
    /// Written last, after calibration.
    pub mode: Mode,
    /// Compute the calibration from the handle's shunt resistance and write it.
    pub calibrate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            average: Average::_16,
            bus_conversion_time: ConversionTime::_1_1_ms,
            shunt_conversion_time: ConversionTime::_1_1_ms,
            mode: Mode::ShuntAndBusContinuous,
            calibrate: true,
        }
    }
}

impl Config {
    pub fn average(mut self, value: Average) -> Self {
        self.average = value;
        self
    }

    pub fn bus_conversion_time(mut self, value: ConversionTime) -> Self {
        self.bus_conversion_time = value;
        self
    }

    pub fn shunt_conversion_time(mut self, value: ConversionTime) -> Self {
        self.shunt_conversion_time = value;
        self
    }

    pub fn mode(mut self, value: Mode) -> Self {
        self.mode = value;
        self
    }

    pub fn calibrate(mut self, value: bool) -> Self {
        self.calibrate = value;
        self
    }

    /// Worst-case time for one triggered conversion of both channels.
    pub fn conversion_budget_us(&self) -> u32 {
        let per_sample = match self.mode {
            Mode::ShuntVoltageTriggered | Mode::ShuntVoltageContinuous => {
                self.shunt_conversion_time.micros()
            }
            Mode::BusVoltageTriggered | Mode::BusVoltageContinuous => {
                self.bus_conversion_time.micros()
            }
            Mode::ShuntAndBusTriggered | Mode::ShuntAndBusContinuous => {
                self.shunt_conversion_time.micros() + self.bus_conversion_time.micros()
            }
            Mode::PowerDown | Mode::Shutdown => 0,
        };
        per_sample * self.average.samples() as u32
    }
}
