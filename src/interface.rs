//! Capabilities injected into a driver handle.
//!
//! The driver never touches a bus, timer or console directly. It is handed:
//!
//! * an [`Interface`] that opens/closes the transport and moves 2-byte
//!   register payloads,
//! * a millisecond delay (any [`embedded_hal::delay::DelayNs`]),
//! * a [`DebugPrint`] sink for diagnostics,
//! * an [`AlertHandler`](crate::alert::AlertHandler) for `irq_handler`.
//!
//! [`I2cInterface`] adapts any `embedded_hal::i2c::I2c` bus.

use core::fmt;
use embedded_hal::i2c::I2c;

/// Byte-level register transport.
///
/// Payloads are always two bytes, most significant byte first.
pub trait Interface {
    type Error;

    fn open(&mut self) -> Result<(), Self::Error>;

    fn close(&mut self) -> Result<(), Self::Error>;

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8; 2]) -> Result<(), Self::Error>;

    fn write(&mut self, address: u8, register: u8, buf: &[u8; 2]) -> Result<(), Self::Error>;
}

/// [`Interface`] over an embedded-hal I2C bus.
///
/// The bus is owned for the lifetime of the adapter; open and close are no-ops
/// since the HAL hands out buses already configured.
pub struct I2cInterface<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> I2cInterface<I2C> {
    pub fn new(i2c: I2C) -> Self {
        I2cInterface { i2c }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Interface for I2cInterface<I2C> {
    type Error = I2C::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read(&mut self, address: u8, register: u8, buf: &mut [u8; 2]) -> Result<(), Self::Error> {
        self.i2c.write_read(address, &[register], buf)
    }

    fn write(&mut self, address: u8, register: u8, buf: &[u8; 2]) -> Result<(), Self::Error> {
        self.i2c.write(address, &[register, buf[0], buf[1]])
    }
}

/// Sink for driver diagnostics. Output failures are swallowed by the sink.
pub trait DebugPrint {
    fn print(&mut self, args: fmt::Arguments<'_>);
}

impl<F> DebugPrint for F
where
    F: FnMut(fmt::Arguments<'_>),
{
    fn print(&mut self, args: fmt::Arguments<'_>) {
        (self)(args)
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPrint;

impl DebugPrint for NoopPrint {
    fn print(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Forwards diagnostics to `defmt::debug!`.
#[cfg(feature = "defmt")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefmtPrint;

#[cfg(feature = "defmt")]
impl DebugPrint for DefmtPrint {
    fn print(&mut self, args: fmt::Arguments<'_>) {
        defmt::debug!("{}", defmt::Display2Format(&args));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn read_is_a_single_write_read() {
        let expectations = [I2cTransaction::write_read(
            0x40,
            vec![0xFE],
            vec![0x54, 0x49],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c);

        let mut buf = [0u8; 2];
        interface.read(0x40, 0xFE, &mut buf).unwrap();
        assert_eq!(buf, [0x54, 0x49]);

        interface.release().done();
    }

    #[test]
    fn write_prefixes_register_index() {
        let expectations = [I2cTransaction::write(0x45, vec![0x05, 0x08, 0x00])];
        let i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c);

        interface.open().unwrap();
        interface.write(0x45, 0x05, &[0x08, 0x00]).unwrap();
        interface.close().unwrap();

        interface.release().done();
    }

    fn as_sink<F: FnMut(fmt::Arguments<'_>)>(f: F) -> F {
        f
    }

    #[test]
    fn closure_is_a_debug_sink() {
        let mut count = 0;
        {
            let mut sink = as_sink(|_| count += 1);
            sink.print(format_args!("ina226: {}.", "test"));
            sink.print(format_args!("ina226: {}.", "test"));
        }
        assert_eq!(count, 2);
    }
}
