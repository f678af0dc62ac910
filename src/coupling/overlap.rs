use crate::c64;
use ndarray::prelude::*;
use num_traits::Zero;

/// Inner product <bra|ket> = sum_k conj(bra_k) * ket_k, summed in the natural index order.
pub fn overlap(bra: ArrayView1<c64>, ket: ArrayView1<c64>) -> c64 {
    bra.iter()
        .zip(ket.iter())
        .fold(c64::zero(), |acc, (b, k)| acc + b.conj() * k)
}

/// L2 norm of a coefficient vector.
pub fn norm(coefficients: ArrayView1<c64>) -> f64 {
    coefficients
        .iter()
        .map(|val| val.norm_sqr())
        .sum::<f64>()
        .sqrt()
}

/// Scales the coefficients to unit norm. A vector of zeros is returned as it is.
pub fn normalize(coefficients: Array1<c64>) -> Array1<c64> {
    let norm: f64 = norm(coefficients.view());
    if norm > 0.0 {
        coefficients.mapv(|val| val / norm)
    } else {
        coefficients
    }
}
