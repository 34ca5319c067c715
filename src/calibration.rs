//! Calibration and unit conversion arithmetic.
//!
//! Forward conversions (register to engineering unit) are exact products.
//! Inverse conversions cast back to an integer and therefore truncate toward
//! zero, so `to_register(to_unit(raw)) == raw` but `to_unit(to_register(x))`
//! can be short of `x` by up to one LSB. That quantization loss is inherent
//! to the register resolution.

use crate::error::Error;

/// Normalized full-scale range the current LSB is derived from.
pub const MAX_RANGE: f64 = 0.08192;

/// Fixed internal scaling constant of the calibration formula.
pub const CALIBRATION_SCALE: f64 = 0.00512;

/// Power LSB is always 25 times the current LSB.
pub const POWER_LSB_RATIO: f64 = 25.0;

/// Shunt voltage codes per millivolt (2.5 uV/bit).
pub const SHUNT_CODES_PER_MV: f32 = 400.0;

/// Bus voltage millivolts per code (1.25 mV/bit).
pub const BUS_MV_PER_CODE: f32 = 1.25;

const RESISTANCE_EPSILON: f64 = 0.000001;
const FULL_SCALE_CODES: f64 = 32768.0;

/// Result of [`calculate`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Amperes per current register count.
    pub current_lsb: f64,
    /// Value for the calibration register.
    pub code: u16,
}

/// Derive current LSB and calibration code from a shunt resistance in ohms.
pub fn calculate(resistance: f64) -> Result<Calibration, Error> {
    // NaN fails both comparisons and is rejected with zero.
    if !(resistance > RESISTANCE_EPSILON || resistance < -RESISTANCE_EPSILON) {
        return Err(Error::DegenerateResistance);
    }

    let current_lsb = MAX_RANGE / resistance / FULL_SCALE_CODES;
    let code = CALIBRATION_SCALE / (MAX_RANGE / FULL_SCALE_CODES) + 0.5;

    Ok(Calibration {
        current_lsb,
        code: code as u16,
    })
}

pub fn shunt_voltage_to_mv(raw: i16) -> f32 {
    raw as f32 / SHUNT_CODES_PER_MV
}

pub fn shunt_voltage_to_register(mv: f32) -> i16 {
    (mv * SHUNT_CODES_PER_MV) as i16
}

pub fn bus_voltage_to_mv(raw: u16) -> f32 {
    raw as f32 * BUS_MV_PER_CODE
}

pub fn bus_voltage_to_register(mv: f32) -> u16 {
    (mv / BUS_MV_PER_CODE) as u16
}

pub fn current_to_ma(raw: i16, current_lsb: f64) -> f32 {
    (raw as f64 * current_lsb * 1000.0) as f32
}

pub fn current_to_register(ma: f32, current_lsb: f64) -> i16 {
    (ma as f64 / (current_lsb * 1000.0)) as i16
}

pub fn power_to_mw(raw: u16, current_lsb: f64) -> f32 {
    (raw as f64 * current_lsb * POWER_LSB_RATIO * 1000.0) as f32
}

pub fn power_to_register(mw: f32, current_lsb: f64) -> u16 {
    (mw as f64 / (current_lsb * POWER_LSB_RATIO * 1000.0)) as u16
}
