use crate::c64;
use crate::errors::NacError;
use ndarray::prelude::*;

pub use memory::MemorySnapshot;
pub use wavecar::{Wavecar, WavecarPrecision};

pub mod memory;
pub mod wavecar;

/// Read access to one wavefunction snapshot. All selectors are 1-based, the
/// energy table is indexed `[spin, kpoint, band]` starting from 0.
///
/// Reading takes `&self` so that a snapshot can serve several band pairs at the same
/// time; implementations with mutable file state have to lock internally.
pub trait WavefunctionSource {
    fn n_spins(&self) -> usize;

    fn n_kpoints(&self) -> usize;

    fn n_bands(&self) -> usize;

    /// Number of plane waves at the k-point `ikpt`, 0 if there is no such k-point.
    fn n_plane_waves(&self, ikpt: usize) -> usize;

    fn energies(&self) -> ArrayView3<f64>;

    /// L2-normalized plane-wave coefficients of one band.
    fn read_band_coefficients(
        &self,
        ispin: usize,
        ikpt: usize,
        iband: usize,
    ) -> Result<Array1<c64>, NacError>;

    /// Name of the snapshot used in log messages and errors.
    fn name(&self) -> String;

    /// Checks 1-based spin, k-point and band selectors against the dimensions of the snapshot.
    fn check_index(&self, ispin: usize, ikpt: usize, iband: usize) -> Result<(), NacError> {
        check_selector("spin", ispin, self.n_spins())?;
        check_selector("k-point", ikpt, self.n_kpoints())?;
        check_selector("band", iband, self.n_bands())
    }
}

pub(crate) fn check_selector(what: &'static str, index: usize, max: usize) -> Result<(), NacError> {
    if index < 1 || index > max {
        return Err(NacError::InvalidIndex { what, index, max });
    }
    Ok(())
}
