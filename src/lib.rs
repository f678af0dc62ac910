pub mod coupling;
pub mod defaults;
pub mod driver;
pub mod errors;
pub mod initialization;
pub mod interface;
pub mod output;
pub use ndarray::prelude::*;

/// Double precision complex number, used for plane-wave coefficients
/// and complex couplings.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

pub use crate::coupling::{
    nac_from_sources, nac_from_wavecars, nac_from_wavecars_gamma, CouplingElement,
    NacMatrixKind, NacOutput, NacParameters,
};
pub use crate::errors::NacError;
pub use crate::interface::WavefunctionSource;
