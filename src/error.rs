use core::fmt::Display;

/// Injected capability slots of a driver handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capability {
    Interface,
    Delay,
    DebugPrint,
    AlertHandler,
}

impl Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Capability::Interface => write!(f, "interface"),
            Capability::Delay => write!(f, "delay_ms"),
            Capability::DebugPrint => write!(f, "debug_print"),
            Capability::AlertHandler => write!(f, "alert_handler"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Operation needs an initialised handle.
    NotInitialized,
    /// A capability slot was left empty when `init` ran.
    MissingCapability(Capability),
    /// The manufacturer register did not hold the expected id.
    IdentityMismatch { found: u16 },
    /// The reset bit was still set after the settle delay.
    ResetNotConfirmed,
    /// A register read or write failed on the bus.
    Transport,
    TransportOpenFailed,
    TransportCloseFailed,
    /// No strap address answered with the manufacturer id.
    DeviceNotFound,
    /// The device flagged an overflow in its current/power arithmetic.
    MathOverflow,
    /// Conversion-ready never showed up within the poll budget.
    ReadTimeout,
    /// Shunt resistance too close to zero to derive a current LSB.
    DegenerateResistance,
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotInitialized => write!(f, "Handle is not initialized"),
            Error::MissingCapability(cap) => write!(f, "Missing capability: {}", cap),
            Error::IdentityMismatch { found } => {
                write!(f, "Invalid Manufacturer 0x{:04X}", found)
            }
            Error::ResetNotConfirmed => write!(f, "Soft reset failed"),
            Error::Transport => write!(f, "Bus transfer failed"),
            Error::TransportOpenFailed => write!(f, "Bus init failed"),
            Error::TransportCloseFailed => write!(f, "Bus deinit failed"),
            Error::DeviceNotFound => write!(f, "No INA226 found on the bus"),
            Error::MathOverflow => write!(f, "Math overflow"),
            Error::ReadTimeout => write!(f, "Read timeout"),
            Error::DegenerateResistance => write!(f, "Resistance can't be zero"),
        }
    }
}

pub(crate) fn bus_error<E>(_: E) -> Error {
    Error::Transport
}
