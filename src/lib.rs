//! Register-level driver for the TI INA226 bi-directional current and power
//! monitor.
//!
//! The handle owns its capabilities (transport, delay, debug sink, alert
//! handler) and keeps only the state the chip cannot report back: the current
//! LSB derived from the shunt resistance and whether a triggered conversion is
//! still unread.
//!
//! ```ignore
//! use ina226_monitor::{Config, I2cInterface, Ina226, NoopPrint, Pin, Status};
//!
//! let mut ina = Ina226::new();
//! ina.set_address_pins(Pin::Gnd, Pin::Gnd)
//!     .set_resistance(0.004)
//!     .link_interface(I2cInterface::new(i2c))
//!     .link_delay(delay)
//!     .link_debug_print(NoopPrint)
//!     .link_alert_handler(|status: Status| led.toggle());
//!
//! ina.init()?;
//! ina.configure(&Config::default())?;
//! let bus = ina.read_bus_voltage()?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: `defmt::Format` on public types, a `DefmtPrint` debug sink
//!   and tracing of every register write.
//! - **`critical-section`**: lets [`AlertFlag`] swap atomically on cores
//!   without native compare-and-swap.

#![cfg_attr(not(test), no_std)]

use core::fmt::Display;

pub mod alert;
pub mod calibration;
pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod interface;
pub mod register;

#[cfg(test)]
mod sim;

pub use alert::{AlertFlag, AlertHandler, Status};
pub use calibration::Calibration;
pub use channel::Channel;
pub use config::Config;
pub use driver::{Ina226, Reading, READ_TIMEOUT};
pub use error::{Capability, Error};
#[cfg(feature = "defmt")]
pub use interface::DefmtPrint;
pub use interface::{DebugPrint, I2cInterface, Interface, NoopPrint};
pub use register::{AlertPolarity, Average, ConversionTime, Mode, Register};

/// Connection of an address strap pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pin {
    Gnd = 0,
    Vs = 1,
    Sda = 2,
    Scl = 3,
}

impl Pin {
    pub const ALL: [Pin; 4] = [Pin::Gnd, Pin::Vs, Pin::Sda, Pin::Scl];
}

impl Display for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Pin::Gnd => write!(f, "GND"),
            Pin::Vs => write!(f, "VS"),
            Pin::Sda => write!(f, "SDA"),
            Pin::Scl => write!(f, "SCL"),
        }
    }
}

/// 7-bit bus address selected by the A0/A1 straps (0x40..=0x4F).
pub const fn address_from_pins(a0: Pin, a1: Pin) -> u8 {
    0x40 | ((a1 as u8) << 2) | (a0 as u8)
}

/// Static chip and driver information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Info {
    pub chip_name: &'static str,
    pub manufacturer_name: &'static str,
    pub interface: &'static str,
    pub supply_voltage_min_v: f32,
    pub supply_voltage_max_v: f32,
    pub max_current_ma: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub driver_version: u32,
}

pub const fn info() -> Info {
    Info {
        chip_name: "Texas Instruments INA226",
        manufacturer_name: "Texas Instruments",
        interface: "IIC",
        supply_voltage_min_v: 2.7,
        supply_voltage_max_v: 5.5,
        max_current_ma: 0.33,
        temperature_min: -40.0,
        temperature_max: 125.0,
        driver_version: 1000,
    }
}
