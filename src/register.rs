//! Register map and bitfield codecs for the INA226.
//!
//! The configuration register and the mask/enable register are both plain
//! `u16` values on the wire. [`ConfigRegister`] and [`MaskRegister`] wrap them
//! with named field accessors so every read-modify-write in the driver touches
//! exactly one field.

use core::fmt::Display;

/// Expected content of [`Register::Manufacturer`] ("TI" in ASCII).
pub const MANUFACTURER_ID: u16 = 0x5449;

/// Configuration register content after power-on or soft reset.
pub const CONFIG_RESET_VALUE: u16 = 0x4127;

pub const CONFIG_RESET_BIT: u16 = 1 << 15;
pub const CONFIG_AVG_SHIFT: u16 = 9;
pub const CONFIG_AVG_MASK: u16 = 0x07 << CONFIG_AVG_SHIFT;
pub const CONFIG_VBUSCT_SHIFT: u16 = 6;
pub const CONFIG_VBUSCT_MASK: u16 = 0x07 << CONFIG_VBUSCT_SHIFT;
pub const CONFIG_VSHCT_SHIFT: u16 = 3;
pub const CONFIG_VSHCT_MASK: u16 = 0x07 << CONFIG_VSHCT_SHIFT;
pub const CONFIG_MODE_SHIFT: u16 = 0;
pub const CONFIG_MODE_MASK: u16 = 0x07 << CONFIG_MODE_SHIFT;

pub const DIE_DEVICE_ID_SHIFT: u16 = 4;
pub const DIE_DEVICE_ID_MASK: u16 = 0x0FFF;
pub const DIE_REVISION_MASK: u16 = 0x000F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Configuration = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
    MaskEnable = 0x06,
    AlertLimit = 0x07,
    Manufacturer = 0xFE,
    DieId = 0xFF,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Register::Configuration => write!(f, "conf"),
            Register::ShuntVoltage => write!(f, "shunt voltage"),
            Register::BusVoltage => write!(f, "bus voltage"),
            Register::Power => write!(f, "power"),
            Register::Current => write!(f, "current"),
            Register::Calibration => write!(f, "calibration"),
            Register::MaskEnable => write!(f, "mask"),
            Register::AlertLimit => write!(f, "alert limit"),
            Register::Manufacturer => write!(f, "manufacturer"),
            Register::DieId => write!(f, "die"),
        }
    }
}

/// Number of samples averaged per conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Average {
    _1 = 0x00,
    _4 = 0x01,
    _16 = 0x02,
    _64 = 0x03,
    _128 = 0x04,
    _256 = 0x05,
    _512 = 0x06,
    _1024 = 0x07,
}

impl Average {
    pub const ALL: [Average; 8] = [
        Average::_1,
        Average::_4,
        Average::_16,
        Average::_64,
        Average::_128,
        Average::_256,
        Average::_512,
        Average::_1024,
    ];

    fn from_bits(bits: u16) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    /// Sample count this setting stands for.
    pub const fn samples(self) -> u16 {
        match self {
            Average::_1 => 1,
            Average::_4 => 4,
            Average::_16 => 16,
            Average::_64 => 64,
            Average::_128 => 128,
            Average::_256 => 256,
            Average::_512 => 512,
            Average::_1024 => 1024,
        }
    }
}

/// Conversion time, shared by the bus and the shunt voltage fields.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionTime {
    _140_us = 0x00,
    _204_us = 0x01,
    _332_us = 0x02,
    _588_us = 0x03,
    _1_1_ms = 0x04,
    _2_116_ms = 0x05,
    _4_156_ms = 0x06,
    _8_244_ms = 0x07,
}

impl ConversionTime {
    pub const ALL: [ConversionTime; 8] = [
        ConversionTime::_140_us,
        ConversionTime::_204_us,
        ConversionTime::_332_us,
        ConversionTime::_588_us,
        ConversionTime::_1_1_ms,
        ConversionTime::_2_116_ms,
        ConversionTime::_4_156_ms,
        ConversionTime::_8_244_ms,
    ];

    fn from_bits(bits: u16) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    pub const fn micros(self) -> u32 {
        match self {
            ConversionTime::_140_us => 140,
            ConversionTime::_204_us => 204,
            ConversionTime::_332_us => 332,
            ConversionTime::_588_us => 588,
            ConversionTime::_1_1_ms => 1100,
            ConversionTime::_2_116_ms => 2116,
            ConversionTime::_4_156_ms => 4156,
            ConversionTime::_8_244_ms => 8244,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    PowerDown = 0x00,
    ShuntVoltageTriggered = 0x01,
    BusVoltageTriggered = 0x02,
    ShuntAndBusTriggered = 0x03,
    Shutdown = 0x04,
    ShuntVoltageContinuous = 0x05,
    BusVoltageContinuous = 0x06,
    ShuntAndBusContinuous = 0x07,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::PowerDown,
        Mode::ShuntVoltageTriggered,
        Mode::BusVoltageTriggered,
        Mode::ShuntAndBusTriggered,
        Mode::Shutdown,
        Mode::ShuntVoltageContinuous,
        Mode::BusVoltageContinuous,
        Mode::ShuntAndBusContinuous,
    ];

    fn from_bits(bits: u16) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    /// Single-shot modes: one conversion per mode write, then idle.
    pub const fn is_triggered(self) -> bool {
        matches!(
            self,
            Mode::ShuntVoltageTriggered | Mode::BusVoltageTriggered | Mode::ShuntAndBusTriggered
        )
    }

    pub const fn is_continuous(self) -> bool {
        matches!(
            self,
            Mode::ShuntVoltageContinuous | Mode::BusVoltageContinuous | Mode::ShuntAndBusContinuous
        )
    }
}

/// Bit positions of the mask/enable register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskBit {
    ShuntOverVoltage = 15,
    ShuntUnderVoltage = 14,
    BusOverVoltage = 13,
    BusUnderVoltage = 12,
    PowerOverLimit = 11,
    ConversionReadyAlert = 10,
    AlertFunctionFlag = 4,
    ConversionReadyFlag = 3,
    MathOverflowFlag = 2,
    AlertPolarity = 1,
    AlertLatchEnable = 0,
}

impl MaskBit {
    pub const fn mask(self) -> u16 {
        1 << (self as u16)
    }
}

/// Active level of the open-collector ALERT pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertPolarity {
    /// Active low.
    Normal = 0,
    /// Active high.
    Inverted = 1,
}

/// Configuration register (0x00).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigRegister(pub u16);

impl ConfigRegister {
    pub fn reset(self) -> bool {
        self.0 & CONFIG_RESET_BIT != 0
    }

    pub fn with_reset(self) -> Self {
        Self(self.0 | CONFIG_RESET_BIT)
    }

    pub fn average(self) -> Average {
        Average::from_bits(self.0 >> CONFIG_AVG_SHIFT)
    }

    pub fn with_average(self, value: Average) -> Self {
        Self((self.0 & !CONFIG_AVG_MASK) | ((value as u16) << CONFIG_AVG_SHIFT))
    }

    pub fn bus_conversion_time(self) -> ConversionTime {
        ConversionTime::from_bits(self.0 >> CONFIG_VBUSCT_SHIFT)
    }

    pub fn with_bus_conversion_time(self, value: ConversionTime) -> Self {
        Self((self.0 & !CONFIG_VBUSCT_MASK) | ((value as u16) << CONFIG_VBUSCT_SHIFT))
    }

    pub fn shunt_conversion_time(self) -> ConversionTime {
        ConversionTime::from_bits(self.0 >> CONFIG_VSHCT_SHIFT)
    }

    pub fn with_shunt_conversion_time(self, value: ConversionTime) -> Self {
        Self((self.0 & !CONFIG_VSHCT_MASK) | ((value as u16) << CONFIG_VSHCT_SHIFT))
    }

    pub fn mode(self) -> Mode {
        Mode::from_bits(self.0 >> CONFIG_MODE_SHIFT)
    }

    pub fn with_mode(self, value: Mode) -> Self {
        Self((self.0 & !CONFIG_MODE_MASK) | ((value as u16) << CONFIG_MODE_SHIFT))
    }
}

impl Default for ConfigRegister {
    fn default() -> Self {
        Self(CONFIG_RESET_VALUE)
    }
}

/// Mask/enable register (0x06).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MaskRegister(pub u16);

impl MaskRegister {
    pub fn get(self, bit: MaskBit) -> bool {
        self.0 & bit.mask() != 0
    }

    pub fn with(self, bit: MaskBit, enable: bool) -> Self {
        let cleared = self.0 & !bit.mask();
        if enable {
            Self(cleared | bit.mask())
        } else {
            Self(cleared)
        }
    }

    pub fn conversion_ready(self) -> bool {
        self.get(MaskBit::ConversionReadyFlag)
    }

    pub fn math_overflow(self) -> bool {
        self.get(MaskBit::MathOverflowFlag)
    }

    pub fn alert_function(self) -> bool {
        self.get(MaskBit::AlertFunctionFlag)
    }
}
