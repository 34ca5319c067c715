//! Device handle.
//!
//! An [`Ina226`] starts out empty: address and shunt resistance are plain
//! fields, capabilities are linked one by one. [`Ina226::init`] checks that
//! every capability is present, verifies the manufacturer id and soft-resets
//! the chip. Every register operation afterwards requires the handle to be
//! initialised until [`Ina226::deinit`] powers the device down and closes
//! the transport.
//!
//! In triggered modes the first measurement read after a mode write polls
//! the conversion-ready flag; later reads of the same conversion go straight
//! to the result registers.

use byteorder::{BigEndian, ByteOrder};
use core::fmt;
use embedded_hal::delay::DelayNs;

use crate::alert::{AlertHandler, Status};
use crate::calibration;
use crate::config::Config;
use crate::error::{bus_error, Capability, Error};
use crate::interface::{DebugPrint, Interface};
use crate::register::{
    AlertPolarity, Average, ConfigRegister, ConversionTime, MaskBit, MaskRegister, Mode, Register,
    DIE_DEVICE_ID_MASK, DIE_DEVICE_ID_SHIFT, DIE_REVISION_MASK, MANUFACTURER_ID,
};
use crate::{address_from_pins, Pin};

/// Default poll budget of a triggered read, in 1 ms steps.
pub const READ_TIMEOUT: u16 = 1000;

const RESET_SETTLE_MS: u32 = 10;

/// Raw register content together with its value in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading<T> {
    pub raw: T,
    pub value: f32,
}

pub struct Ina226<IF, D, P, A> {
    address: u8,
    resistance: f64,
    current_lsb: f64,
    trigger: bool,
    inited: bool,
    read_timeout: u16,
    interface: Option<IF>,
    delay: Option<D>,
    debug: Option<P>,
    alert: Option<A>,
}

impl<IF, D, P, A> Default for Ina226<IF, D, P, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IF, D, P, A> Ina226<IF, D, P, A> {
    pub fn new() -> Self {
        Ina226 {
            address: 0,
            resistance: 0.0,
            current_lsb: 0.0,
            trigger: false,
            inited: false,
            read_timeout: READ_TIMEOUT,
            interface: None,
            delay: None,
            debug: None,
            alert: None,
        }
    }

    pub fn link_interface(&mut self, interface: IF) -> &mut Self {
        self.interface = Some(interface);
        self
    }

    pub fn link_delay(&mut self, delay: D) -> &mut Self {
        self.delay = Some(delay);
        self
    }

    pub fn link_debug_print(&mut self, debug: P) -> &mut Self {
        self.debug = Some(debug);
        self
    }

    pub fn link_alert_handler(&mut self, alert: A) -> &mut Self {
        self.alert = Some(alert);
        self
    }

    /// Set the 7-bit bus address. Takes effect on the next transfer.
    ///
    /// Only the low seven bits are kept: an 8-bit write address such as
    /// `0x8A` becomes `0x0A`, not `0x45`. Pass the 7-bit form.
    pub fn set_address(&mut self, address: u8) -> &mut Self {
        self.address = address & 0x7F;
        self
    }

    /// Set the bus address from the A0/A1 pin straps.
    pub fn set_address_pins(&mut self, a0: Pin, a1: Pin) -> &mut Self {
        self.set_address(address_from_pins(a0, a1))
    }

    pub fn get_address(&self) -> u8 {
        self.address
    }

    /// Shunt resistance in ohms, used by `calculate_calibration`.
    pub fn set_resistance(&mut self, resistance: f64) -> &mut Self {
        self.resistance = resistance;
        self
    }

    pub fn get_resistance(&self) -> f64 {
        self.resistance
    }

    /// Poll budget for triggered reads, in milliseconds.
    pub fn set_read_timeout(&mut self, timeout: u16) -> &mut Self {
        self.read_timeout = timeout;
        self
    }

    pub fn get_read_timeout(&self) -> u16 {
        self.read_timeout
    }

    /// Amperes per count, zero until `calculate_calibration` ran.
    pub fn current_lsb(&self) -> f64 {
        self.current_lsb
    }

    pub fn is_initialized(&self) -> bool {
        self.inited
    }

    /// True between a triggered mode write and the first read that saw the
    /// conversion complete.
    pub fn trigger_pending(&self) -> bool {
        self.trigger
    }

    pub fn interface(&self) -> Option<&IF> {
        self.interface.as_ref()
    }

    pub fn interface_mut(&mut self) -> Option<&mut IF> {
        self.interface.as_mut()
    }

    /// Hand the transport back. The handle is left uninitialised.
    pub fn release_interface(&mut self) -> Option<IF> {
        self.inited = false;
        self.trigger = false;
        self.interface.take()
    }

    fn check_initialized(&self) -> Result<(), Error> {
        if !self.inited {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }
}

impl<IF, D, P, A> Ina226<IF, D, P, A>
where
    IF: Interface,
    D: DelayNs,
    P: DebugPrint,
    A: AlertHandler,
{
    fn log(&mut self, args: fmt::Arguments<'_>) {
        if let Some(debug) = self.debug.as_mut() {
            debug.print(args);
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        if let Some(delay) = self.delay.as_mut() {
            delay.delay_ms(ms);
        }
    }

    fn read_raw(&mut self, register: u8) -> Result<u16, Error> {
        let address = self.address;
        let interface = self
            .interface
            .as_mut()
            .ok_or(Error::MissingCapability(Capability::Interface))?;

        let mut rx_buffer: [u8; 2] = [0; 2];
        interface
            .read(address, register, &mut rx_buffer)
            .map_err(bus_error)?;
        Ok(BigEndian::read_u16(&rx_buffer))
    }

    fn write_raw(&mut self, register: u8, value: u16) -> Result<(), Error> {
        let address = self.address;
        let interface = self
            .interface
            .as_mut()
            .ok_or(Error::MissingCapability(Capability::Interface))?;

        let mut tx_buffer: [u8; 2] = [0; 2];
        BigEndian::write_u16(&mut tx_buffer, value);
        interface
            .write(address, register, &tx_buffer)
            .map_err(bus_error)
    }

    fn read_register(&mut self, register: Register) -> Result<u16, Error> {
        match self.read_raw(register.addr()) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.log(format_args!("ina226: read {} register failed.\n", register));
                Err(e)
            }
        }
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("ina226@{=u8:#x}: {} <- {=u16:#x}", self.address, register, value);

        match self.write_raw(register.addr(), value) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log(format_args!("ina226: write {} register failed.\n", register));
                Err(e)
            }
        }
    }

    fn close_quietly(&mut self) {
        if let Some(interface) = self.interface.as_mut() {
            let _ = interface.close();
        }
    }

    fn check_capabilities(&mut self) -> Result<(), Error> {
        if self.debug.is_none() {
            return Err(Error::MissingCapability(Capability::DebugPrint));
        }
        let missing = if self.interface.is_none() {
            Some(Capability::Interface)
        } else if self.delay.is_none() {
            Some(Capability::Delay)
        } else if self.alert.is_none() {
            Some(Capability::AlertHandler)
        } else {
            None
        };
        match missing {
            Some(capability) => {
                self.log(format_args!("ina226: {} is null.\n", capability));
                Err(Error::MissingCapability(capability))
            }
            None => Ok(()),
        }
    }

    fn verify_and_reset(&mut self) -> Result<(), Error> {
        let manufacturer = self.read_register(Register::Manufacturer)?;
        if manufacturer != MANUFACTURER_ID {
            self.log(format_args!("ina226: id is invalid.\n"));
            return Err(Error::IdentityMismatch {
                found: manufacturer,
            });
        }

        let conf = ConfigRegister(self.read_register(Register::Configuration)?);
        self.write_register(Register::Configuration, conf.with_reset().0)?;
        self.delay_ms(RESET_SETTLE_MS);
        let conf = ConfigRegister(self.read_register(Register::Configuration)?);
        if conf.reset() {
            self.log(format_args!("ina226: soft reset failed.\n"));
            return Err(Error::ResetNotConfirmed);
        }
        Ok(())
    }

    /// Bring the device up.
    ///
    /// On any failure after the transport was opened, the transport is closed
    /// again and the handle stays uninitialised.
    pub fn init(&mut self) -> Result<(), Error> {
        self.check_capabilities()?;
        self.inited = false;

        let opened = match self.interface.as_mut() {
            Some(interface) => interface.open().is_ok(),
            None => false,
        };
        if !opened {
            self.log(format_args!("ina226: iic init failed.\n"));
            return Err(Error::TransportOpenFailed);
        }

        if let Err(e) = self.verify_and_reset() {
            self.close_quietly();
            return Err(e);
        }

        self.trigger = false;
        self.inited = true;
        Ok(())
    }

    /// Power the device down and close the transport.
    ///
    /// If the power-down write fails the handle stays initialised so the
    /// call can be retried. A failed close still leaves the handle
    /// uninitialised since the device is already powered down.
    pub fn deinit(&mut self) -> Result<(), Error> {
        self.check_initialized()?;

        if let Err(e) = self.set_mode(Mode::PowerDown) {
            self.log(format_args!("ina226: power down failed.\n"));
            return Err(e);
        }
        self.inited = false;

        let closed = match self.interface.as_mut() {
            Some(interface) => interface.close().is_ok(),
            None => false,
        };
        if !closed {
            self.log(format_args!("ina226: iic deinit failed.\n"));
            return Err(Error::TransportCloseFailed);
        }
        Ok(())
    }

    /// Set the self-clearing reset bit. Registers return to power-on
    /// defaults, which is a continuous mode, so no trigger stays pending.
    pub fn soft_reset(&mut self) -> Result<(), Error> {
        self.update_config(ConfigRegister::with_reset)?;
        self.trigger = false;
        Ok(())
    }

    /// Apply `config` in bring-up order, mode last.
    ///
    /// The read timeout is raised, never lowered, to cover one worst-case
    /// conversion of `config`.
    pub fn configure(&mut self, config: &Config) -> Result<(), Error> {
        let needed = (config.conversion_budget_us() + 999) / 1000;
        if needed > self.read_timeout as u32 {
            self.read_timeout = needed.min(u16::MAX as u32) as u16;
        }

        self.set_average(config.average)?;
        self.set_bus_conversion_time(config.bus_conversion_time)?;
        self.set_shunt_conversion_time(config.shunt_conversion_time)?;
        if config.calibrate {
            let code = self.calculate_calibration()?;
            self.set_calibration(code)?;
        }
        self.set_mode(config.mode)
    }

    /// Probe the 16 strap addresses for the manufacturer id.
    ///
    /// Call before `init`. The transport is opened for the scan and closed
    /// afterwards; on success the handle keeps the found address.
    pub fn search_address(&mut self) -> Result<u8, Error> {
        match self.interface.as_mut() {
            Some(interface) => interface.open().map_err(|_| Error::TransportOpenFailed)?,
            None => return Err(Error::MissingCapability(Capability::Interface)),
        }

        let previous = self.address;
        for a1 in Pin::ALL {
            for a0 in Pin::ALL {
                self.address = address_from_pins(a0, a1);
                if self.read_raw(Register::Manufacturer.addr()) == Ok(MANUFACTURER_ID) {
                    self.close_quietly();
                    return Ok(self.address);
                }
            }
        }

        self.address = previous;
        self.close_quietly();
        self.log(format_args!("ina226: no device found.\n"));
        Err(Error::DeviceNotFound)
    }

    //
    // Configuration register
    //

    fn get_config(&mut self) -> Result<ConfigRegister, Error> {
        self.check_initialized()?;
        Ok(ConfigRegister(self.read_register(Register::Configuration)?))
    }

    fn update_config<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(ConfigRegister) -> ConfigRegister,
    {
        let conf = self.get_config()?;
        self.write_register(Register::Configuration, f(conf).0)
    }

    pub fn set_average(&mut self, value: Average) -> Result<(), Error> {
        self.update_config(|conf| conf.with_average(value))
    }

    pub fn get_average(&mut self) -> Result<Average, Error> {
        Ok(self.get_config()?.average())
    }

    pub fn set_bus_conversion_time(&mut self, value: ConversionTime) -> Result<(), Error> {
        self.update_config(|conf| conf.with_bus_conversion_time(value))
    }

    pub fn get_bus_conversion_time(&mut self) -> Result<ConversionTime, Error> {
        Ok(self.get_config()?.bus_conversion_time())
    }

    pub fn set_shunt_conversion_time(&mut self, value: ConversionTime) -> Result<(), Error> {
        self.update_config(|conf| conf.with_shunt_conversion_time(value))
    }

    pub fn get_shunt_conversion_time(&mut self) -> Result<ConversionTime, Error> {
        Ok(self.get_config()?.shunt_conversion_time())
    }

    /// Write the operating mode. A triggered mode starts a conversion and
    /// arms the conversion-ready wait of the next measurement read.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        self.update_config(|conf| conf.with_mode(mode))?;
        self.trigger = mode.is_triggered();
        Ok(())
    }

    pub fn get_mode(&mut self) -> Result<Mode, Error> {
        Ok(self.get_config()?.mode())
    }

    /// Device id (12 bits) and die revision (4 bits).
    pub fn get_die_id(&mut self) -> Result<(u16, u8), Error> {
        self.check_initialized()?;
        let die = self.read_register(Register::DieId)?;
        Ok((
            (die >> DIE_DEVICE_ID_SHIFT) & DIE_DEVICE_ID_MASK,
            (die & DIE_REVISION_MASK) as u8,
        ))
    }

    //
    // Measurements
    //

    fn wait_for_conversion(&mut self) -> Result<(), Error> {
        let mut mask = MaskRegister(self.read_register(Register::MaskEnable)?);
        if mask.math_overflow() {
            self.log(format_args!("ina226: math overflow.\n"));
            return Err(Error::MathOverflow);
        }

        if self.trigger {
            if !mask.conversion_ready() {
                let mut timeout = self.read_timeout;
                while timeout > 0 {
                    mask = MaskRegister(self.read_register(Register::MaskEnable)?);
                    if mask.conversion_ready() {
                        break;
                    }
                    self.delay_ms(1);
                    timeout -= 1;
                }
                if timeout == 0 {
                    self.log(format_args!("ina226: read timeout.\n"));
                    return Err(Error::ReadTimeout);
                }
            }
            self.trigger = false;
        }
        Ok(())
    }

    /// Shunt voltage in mV.
    pub fn read_shunt_voltage(&mut self) -> Result<Reading<i16>, Error> {
        self.check_initialized()?;
        self.wait_for_conversion()?;
        let raw = self.read_register(Register::ShuntVoltage)? as i16;
        Ok(Reading {
            raw,
            value: calibration::shunt_voltage_to_mv(raw),
        })
    }

    /// Bus voltage in mV.
    pub fn read_bus_voltage(&mut self) -> Result<Reading<u16>, Error> {
        self.check_initialized()?;
        self.wait_for_conversion()?;
        let raw = self.read_register(Register::BusVoltage)?;
        Ok(Reading {
            raw,
            value: calibration::bus_voltage_to_mv(raw),
        })
    }

    /// Current in mA. Meaningless until calibration was calculated and written.
    pub fn read_current(&mut self) -> Result<Reading<i16>, Error> {
        self.check_initialized()?;
        self.wait_for_conversion()?;
        let raw = self.read_register(Register::Current)? as i16;
        Ok(Reading {
            raw,
            value: calibration::current_to_ma(raw, self.current_lsb),
        })
    }

    /// Power in mW. Meaningless until calibration was calculated and written.
    pub fn read_power(&mut self) -> Result<Reading<u16>, Error> {
        self.check_initialized()?;
        self.wait_for_conversion()?;
        let raw = self.read_register(Register::Power)?;
        Ok(Reading {
            raw,
            value: calibration::power_to_mw(raw, self.current_lsb),
        })
    }

    //
    // Calibration
    //

    /// Derive the current LSB from the shunt resistance and return the
    /// matching calibration register value.
    ///
    /// Only the host-side LSB is stored; write the returned code with
    /// `set_calibration` or current and power readings will not match.
    pub fn calculate_calibration(&mut self) -> Result<u16, Error> {
        self.check_initialized()?;
        match calibration::calculate(self.resistance) {
            Ok(cal) => {
                self.current_lsb = cal.current_lsb;
                Ok(cal.code)
            }
            Err(e) => {
                self.log(format_args!("ina226: r can't be zero.\n"));
                Err(e)
            }
        }
    }

    pub fn set_calibration(&mut self, code: u16) -> Result<(), Error> {
        self.check_initialized()?;
        self.write_register(Register::Calibration, code)
    }

    pub fn get_calibration(&mut self) -> Result<u16, Error> {
        self.check_initialized()?;
        self.read_register(Register::Calibration)
    }

    pub fn shunt_voltage_to_register(&self, mv: f32) -> Result<i16, Error> {
        self.check_initialized()?;
        Ok(calibration::shunt_voltage_to_register(mv))
    }

    pub fn shunt_voltage_to_mv(&self, raw: i16) -> Result<f32, Error> {
        self.check_initialized()?;
        Ok(calibration::shunt_voltage_to_mv(raw))
    }

    pub fn bus_voltage_to_register(&self, mv: f32) -> Result<u16, Error> {
        self.check_initialized()?;
        Ok(calibration::bus_voltage_to_register(mv))
    }

    pub fn bus_voltage_to_mv(&self, raw: u16) -> Result<f32, Error> {
        self.check_initialized()?;
        Ok(calibration::bus_voltage_to_mv(raw))
    }

    pub fn current_to_register(&self, ma: f32) -> Result<i16, Error> {
        self.check_initialized()?;
        Ok(calibration::current_to_register(ma, self.current_lsb))
    }

    pub fn current_to_ma(&self, raw: i16) -> Result<f32, Error> {
        self.check_initialized()?;
        Ok(calibration::current_to_ma(raw, self.current_lsb))
    }

    pub fn power_to_register(&self, mw: f32) -> Result<u16, Error> {
        self.check_initialized()?;
        Ok(calibration::power_to_register(mw, self.current_lsb))
    }

    pub fn power_to_mw(&self, raw: u16) -> Result<f32, Error> {
        self.check_initialized()?;
        Ok(calibration::power_to_mw(raw, self.current_lsb))
    }

    //
    // Mask/enable register and alerts
    //

    fn get_mask_register(&mut self) -> Result<MaskRegister, Error> {
        self.check_initialized()?;
        Ok(MaskRegister(self.read_register(Register::MaskEnable)?))
    }

    fn update_mask(&mut self, bit: MaskBit, enable: bool) -> Result<(), Error> {
        let mask = self.get_mask_register()?;
        self.write_register(Register::MaskEnable, mask.with(bit, enable).0)
    }

    /// Enable or disable one alert condition on the ALERT pin.
    pub fn set_mask(&mut self, status: Status, enable: bool) -> Result<(), Error> {
        self.update_mask(status.mask_bit(), enable)
    }

    pub fn get_mask(&mut self, status: Status) -> Result<bool, Error> {
        Ok(self.get_mask_register()?.get(status.mask_bit()))
    }

    pub fn set_conversion_ready_alert_pin(&mut self, enable: bool) -> Result<(), Error> {
        self.update_mask(MaskBit::ConversionReadyAlert, enable)
    }

    pub fn get_conversion_ready_alert_pin(&mut self) -> Result<bool, Error> {
        Ok(self
            .get_mask_register()?
            .get(MaskBit::ConversionReadyAlert))
    }

    pub fn set_alert_polarity(&mut self, polarity: AlertPolarity) -> Result<(), Error> {
        self.update_mask(MaskBit::AlertPolarity, polarity == AlertPolarity::Inverted)
    }

    pub fn get_alert_polarity(&mut self) -> Result<AlertPolarity, Error> {
        if self.get_mask_register()?.get(MaskBit::AlertPolarity) {
            Ok(AlertPolarity::Inverted)
        } else {
            Ok(AlertPolarity::Normal)
        }
    }

    /// Latched alerts hold the pin until the mask register is read.
    pub fn set_alert_latch(&mut self, enable: bool) -> Result<(), Error> {
        self.update_mask(MaskBit::AlertLatchEnable, enable)
    }

    pub fn get_alert_latch(&mut self) -> Result<bool, Error> {
        Ok(self.get_mask_register()?.get(MaskBit::AlertLatchEnable))
    }

    /// Raw alert limit, compared against the register picked by the enabled
    /// mask. Use the `*_to_register` conversions to build it.
    pub fn set_alert_limit(&mut self, value: u16) -> Result<(), Error> {
        self.check_initialized()?;
        self.write_register(Register::AlertLimit, value)
    }

    pub fn get_alert_limit(&mut self) -> Result<u16, Error> {
        self.check_initialized()?;
        self.read_register(Register::AlertLimit)
    }

    /// Read the mask register once and report the highest-priority active
    /// alert to the linked handler.
    ///
    /// Lower-priority conditions latched at the same time are not reported;
    /// call again or read them with `get_mask`.
    pub fn irq_handler(&mut self) -> Result<Option<Status>, Error> {
        let mask = self.get_mask_register()?;
        let status = Status::highest_active(mask);
        if let (Some(status), Some(alert)) = (status, self.alert.as_mut()) {
            alert.on_alert(status);
        }
        Ok(status)
    }

    //
    // Raw access
    //

    pub fn set_register(&mut self, register: u8, value: u16) -> Result<(), Error> {
        self.check_initialized()?;
        self.write_raw(register, value)
    }

    pub fn get_register(&mut self, register: u8) -> Result<u16, Error> {
        self.check_initialized()?;
        self.read_raw(register)
    }
}
