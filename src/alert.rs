use core::fmt::Display;
use portable_atomic::{AtomicBool, Ordering};

use crate::register::{MaskBit, MaskRegister};

/// Alert conditions reported through [`AlertHandler`].
///
/// Discriminants are the bit positions in the mask/enable register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    ShuntOverVoltage = 15,
    ShuntUnderVoltage = 14,
    BusOverVoltage = 13,
    BusUnderVoltage = 12,
    PowerOverLimit = 11,
}

impl Status {
    /// Dispatch order of `irq_handler`, highest priority first.
    pub const PRIORITY: [Status; 5] = [
        Status::ShuntOverVoltage,
        Status::ShuntUnderVoltage,
        Status::BusOverVoltage,
        Status::BusUnderVoltage,
        Status::PowerOverLimit,
    ];

    pub const fn mask_bit(self) -> MaskBit {
        match self {
            Status::ShuntOverVoltage => MaskBit::ShuntOverVoltage,
            Status::ShuntUnderVoltage => MaskBit::ShuntUnderVoltage,
            Status::BusOverVoltage => MaskBit::BusOverVoltage,
            Status::BusUnderVoltage => MaskBit::BusUnderVoltage,
            Status::PowerOverLimit => MaskBit::PowerOverLimit,
        }
    }

    /// Highest-priority condition set in `mask`, if the alert function flag
    /// is raised.
    pub fn highest_active(mask: MaskRegister) -> Option<Status> {
        if !mask.alert_function() {
            return None;
        }
        Self::PRIORITY
            .iter()
            .copied()
            .find(|status| mask.get(status.mask_bit()))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::ShuntOverVoltage => write!(f, "shunt OV"),
            Status::ShuntUnderVoltage => write!(f, "shunt UV"),
            Status::BusOverVoltage => write!(f, "bus OV"),
            Status::BusUnderVoltage => write!(f, "bus UV"),
            Status::PowerOverLimit => write!(f, "power OL"),
        }
    }
}

/// Receives the condition picked by `irq_handler`.
///
/// May run in interrupt context, so implementations must not block or touch
/// the bus.
pub trait AlertHandler {
    fn on_alert(&mut self, status: Status);
}

impl<F> AlertHandler for F
where
    F: FnMut(Status),
{
    fn on_alert(&mut self, status: Status) {
        (self)(status)
    }
}

/// Pending-alert flag shared between the ALERT pin interrupt and the loop
/// that owns the driver.
///
/// `raise` may run in interrupt context; the owner loop calls `take`.
#[derive(Debug, Default)]
pub struct AlertFlag {
    pending: AtomicBool,
}

impl AlertFlag {
    pub const fn new() -> Self {
        AlertFlag {
            pending: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clears the flag and reports whether it was set.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALERT_FUNCTION: u16 = 1 << 4;

    #[test]
    fn shunt_over_voltage_wins() {
        let mask = MaskRegister(0xF800 | ALERT_FUNCTION);
        assert_eq!(
            Status::highest_active(mask),
            Some(Status::ShuntOverVoltage)
        );
    }

    #[test]
    fn priority_walks_down_the_register() {
        let mask = MaskRegister((1 << 12) | (1 << 11) | ALERT_FUNCTION);
        assert_eq!(Status::highest_active(mask), Some(Status::BusUnderVoltage));
        let mask = MaskRegister((1 << 11) | ALERT_FUNCTION);
        assert_eq!(Status::highest_active(mask), Some(Status::PowerOverLimit));
    }

    #[test]
    fn nothing_without_alert_function_flag() {
        assert_eq!(Status::highest_active(MaskRegister(0xF800)), None);
        assert_eq!(Status::highest_active(MaskRegister(ALERT_FUNCTION)), None);
    }

    #[test]
    fn flag_is_taken_once() {
        let flag = AlertFlag::new();
        assert!(!flag.take());
        flag.raise();
        assert!(flag.is_pending());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn raise_between_takes_is_not_lost() {
        static FLAG: AlertFlag = AlertFlag::new();
        let isr = std::thread::spawn(|| {
            for _ in 0..1000 {
                FLAG.raise();
            }
        });
        let mut seen = 0;
        while !isr.is_finished() {
            if FLAG.take() {
                seen += 1;
            }
        }
        isr.join().unwrap();
        if FLAG.take() {
            seen += 1;
        }
        assert!(seen >= 1);
        assert!(!FLAG.is_pending());
    }
}
