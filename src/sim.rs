//! Register file and capability doubles shared by the driver and channel
//! tests.

use core::fmt;
use embedded_hal::delay::DelayNs;
use std::cell::{Cell, RefCell};
use std::fmt::Write;
use std::rc::Rc;

use crate::alert::Status;
use crate::driver::Ina226;
use crate::interface::{DebugPrint, Interface};
use crate::register::{Mode, Register, MANUFACTURER_ID};

pub(crate) const CVRF: u16 = 1 << 3;
pub(crate) const OVF: u16 = 1 << 2;

/// Register file standing in for the chip.
#[derive(Default)]
pub(crate) struct SimDevice {
    pub(crate) conf: u16,
    pub(crate) regs: [u16; 8],
    pub(crate) manufacturer: u16,
    pub(crate) die: u16,
    /// Mask reads left until a triggered conversion completes.
    pub(crate) ready_after: Option<u32>,
    pub(crate) stuck_reset: bool,
    pub(crate) fail_open: bool,
    pub(crate) fail_close: bool,
    pub(crate) fail_read_of: Option<u8>,
    /// Reads of `fail_read_of` that still succeed before it starts failing.
    pub(crate) fail_after: u32,
    pub(crate) fail_writes: bool,
    pub(crate) opens: u32,
    pub(crate) closes: u32,
    pub(crate) mask_reads: u32,
    pub(crate) writes: Vec<(u8, u16)>,
}

impl SimDevice {
    pub(crate) fn new() -> Self {
        SimDevice {
            conf: 0x4127,
            manufacturer: MANUFACTURER_ID,
            die: 0x2260,
            ..Default::default()
        }
    }

    /// Fail reads of `register` once `after` of them went through.
    pub(crate) fn fail_reads_of(&mut self, register: Register, after: u32) {
        self.fail_read_of = Some(register.addr());
        self.fail_after = after;
    }

    pub(crate) fn mask(&self) -> u16 {
        self.regs[Register::MaskEnable as usize]
    }

    pub(crate) fn set_flags(&mut self, flags: u16) {
        self.regs[Register::MaskEnable as usize] |= flags;
    }

    pub(crate) fn set(&mut self, register: Register, value: u16) {
        self.regs[register as usize] = value;
    }
}

#[derive(Debug)]
pub(crate) struct SimError;

impl Interface for SimDevice {
    type Error = SimError;

    fn open(&mut self) -> Result<(), SimError> {
        self.opens += 1;
        if self.fail_open {
            return Err(SimError);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SimError> {
        self.closes += 1;
        if self.fail_close {
            return Err(SimError);
        }
        Ok(())
    }

    fn read(&mut self, _address: u8, register: u8, buf: &mut [u8; 2]) -> Result<(), SimError> {
        if self.fail_read_of == Some(register) {
            if self.fail_after == 0 {
                return Err(SimError);
            }
            self.fail_after -= 1;
        }
        let value = match register {
            0x00 => self.conf,
            0x06 => {
                self.mask_reads += 1;
                if let Some(left) = self.ready_after {
                    if left <= 1 {
                        self.ready_after = None;
                        self.set_flags(CVRF);
                    } else {
                        self.ready_after = Some(left - 1);
                    }
                }
                self.mask()
            }
            0x01..=0x07 => self.regs[register as usize],
            0xFE => self.manufacturer,
            0xFF => self.die,
            _ => 0,
        };
        *buf = value.to_be_bytes();
        Ok(())
    }

    fn write(&mut self, _address: u8, register: u8, buf: &[u8; 2]) -> Result<(), SimError> {
        if self.fail_writes {
            return Err(SimError);
        }
        let value = u16::from_be_bytes(*buf);
        self.writes.push((register, value));
        match register {
            0x00 => {
                if value & 0x8000 != 0 {
                    self.conf = if self.stuck_reset { value } else { 0x4127 };
                } else {
                    self.conf = value;
                    if Mode::ALL[(value & 0x07) as usize].is_triggered() {
                        self.regs[Register::MaskEnable as usize] &= !CVRF;
                    }
                }
            }
            0x05..=0x07 => self.regs[register as usize] = value,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct CountingDelay {
    pub(crate) calls: Rc<Cell<u32>>,
    pub(crate) total_ms: Rc<Cell<u32>>,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.calls.set(self.calls.get() + 1);
        self.total_ms.set(self.total_ms.get() + ms);
    }
}

#[derive(Clone, Default)]
pub(crate) struct Log(pub(crate) Rc<RefCell<String>>);

impl DebugPrint for Log {
    fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.0.borrow_mut().write_fmt(args);
    }
}

pub(crate) type Alerts = Rc<RefCell<Vec<Status>>>;
pub(crate) type SimIna = Ina226<SimDevice, CountingDelay, Log, Box<dyn FnMut(Status)>>;

pub(crate) struct Fixture {
    pub(crate) ina: SimIna,
    pub(crate) delay: CountingDelay,
    pub(crate) log: Log,
    pub(crate) alerts: Alerts,
}

pub(crate) fn linked(device: SimDevice) -> Fixture {
    let delay = CountingDelay::default();
    let log = Log::default();
    let alerts: Alerts = Rc::default();
    let sink = alerts.clone();

    let mut ina: SimIna = Ina226::new();
    ina.set_address(0x40)
        .set_resistance(0.004)
        .link_interface(device)
        .link_delay(delay.clone())
        .link_debug_print(log.clone())
        .link_alert_handler(Box::new(move |status: Status| sink.borrow_mut().push(status)));

    Fixture {
        ina,
        delay,
        log,
        alerts,
    }
}

pub(crate) fn initialized(device: SimDevice) -> Fixture {
    let mut fixture = linked(device);
    fixture.ina.init().unwrap();
    fixture
}

pub(crate) fn sim(ina: &SimIna) -> &SimDevice {
    ina.interface().unwrap()
}

pub(crate) fn sim_mut(ina: &mut SimIna) -> &mut SimDevice {
    ina.interface_mut().unwrap()
}
