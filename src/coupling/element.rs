use crate::c64;
use num_traits::Zero;
use std::fmt::Debug;
use std::ops::{Div, Neg};

/// Element type of the NAC matrix. Gamma-only wavefunctions give real couplings (`f64`),
/// general k-points keep the full complex value (`c64`). The type is fixed once per
/// calculation and threaded through allocation, accumulation and scaling.
pub trait CouplingElement:
    Copy + Send + Sync + Debug + PartialEq + Zero + Neg<Output = Self> + Div<f64, Output = Self>
{
    /// Converts the difference of the two cross-time overlaps into a matrix element.
    fn from_overlap(value: c64) -> Self;

    /// Absolute value of the element.
    fn magnitude(&self) -> f64;

    /// Text representation in the layout of `numpy.savetxt` with the default `%.18e` format.
    fn format_entry(&self) -> String;
}

impl CouplingElement for f64 {
    fn from_overlap(value: c64) -> Self {
        value.re
    }

    fn magnitude(&self) -> f64 {
        self.abs()
    }

    fn format_entry(&self) -> String {
        format_float(*self)
    }
}

impl CouplingElement for c64 {
    fn from_overlap(value: c64) -> Self {
        value
    }

    fn magnitude(&self) -> f64 {
        self.norm()
    }

    fn format_entry(&self) -> String {
        let imag: String = format_float(self.im);
        let sign: &str = if imag.starts_with('-') { "" } else { "+" };
        format!(" ({}{}{}j)", format_float(self.re), sign, imag)
    }
}

/// C-style `%.18e`: at least two exponent digits with explicit sign.
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let repr: String = format!("{:.18e}", value);
    let (mantissa, exponent) = match repr.split_once('e') {
        Some(parts) => parts,
        None => return repr,
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}
