use crate::c64;
use crate::coupling::{overlap, CouplingElement};
use crate::defaults::{DT, IKPT, ISPIN, PARALLEL};
use crate::errors::NacError;
use crate::interface::{check_selector, Wavecar, WavefunctionSource};
use itertools::Itertools;
use log::{debug, info, trace};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rayon::prelude::*;
use std::path::Path;

/// Selection of the time step, k-point and spin channel of one NAC calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NacParameters {
    /// time between the two snapshots, the couplings are given in its inverse unit
    pub dt: f64,
    /// k-point, starting from 1
    pub ikpt: usize,
    /// spin channel, starting from 1
    pub ispin: usize,
    /// evaluate the band pairs on the rayon thread pool
    pub parallel: bool,
}

impl NacParameters {
    pub fn new(dt: f64, ikpt: usize, ispin: usize) -> Self {
        NacParameters {
            dt,
            ikpt,
            ispin,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl Default for NacParameters {
    fn default() -> Self {
        NacParameters {
            dt: DT,
            ikpt: IKPT,
            ispin: ISPIN,
            parallel: PARALLEL,
        }
    }
}

/// Band energies of the first snapshot and the antisymmetric NAC matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct NacOutput<T> {
    pub energies: Array1<f64>,
    pub nac: Array2<T>,
}

/// Result of a calculation whose element type was picked at run time.
#[derive(Clone, Debug, PartialEq)]
pub enum NacMatrixKind {
    Real(NacOutput<f64>),
    Complex(NacOutput<c64>),
}

impl NacMatrixKind {
    pub fn energies(&self) -> ArrayView1<f64> {
        match self {
            NacMatrixKind::Real(output) => output.energies.view(),
            NacMatrixKind::Complex(output) => output.energies.view(),
        }
    }

    pub fn n_bands(&self) -> usize {
        self.energies().len()
    }
}

/// Nonadiabatic couplings between the bands of two snapshots at t and t + dt
///
/// <psi_i(t)| d/dt |psi_j(t)> ~ (<psi_i(t)|psi_j(t+dt)> - <psi_j(t)|psi_i(t+dt)>) / (2 dt)
///
/// Only the pairs j < i are evaluated, the upper triangle is the negative of the lower one
/// and the diagonal stays zero. With `T = f64` (gamma-only wavefunctions) the real part of
/// each coupling is kept, with `T = c64` the complex value. The energies are the band
/// energies of `wave_a` at the selected spin and k-point.
pub fn nac_from_sources<T, A, B>(
    wave_a: &A,
    wave_b: &B,
    params: &NacParameters,
) -> Result<NacOutput<T>, NacError>
where
    T: CouplingElement,
    A: WavefunctionSource + Sync,
    B: WavefunctionSource + Sync,
{
    check_compatibility(wave_a, wave_b, params)?;

    let n_bands: usize = wave_a.n_bands();
    let pairs: Vec<(usize, usize)> = (0..n_bands)
        .tuple_combinations::<(usize, usize)>()
        .map(|(j, i)| (i, j))
        .collect();

    // every pair owns the cells (i, j) and (j, i), the matrix is filled once all pairs are done
    let couplings: Vec<(usize, usize, T)> = if params.parallel {
        pairs
            .into_par_iter()
            .map(|(i, j)| pair_coupling(wave_a, wave_b, i, j, params).map(|value| (i, j, value)))
            .collect::<Result<Vec<_>, NacError>>()?
    } else {
        pairs
            .into_iter()
            .map(|(i, j)| pair_coupling(wave_a, wave_b, i, j, params).map(|value| (i, j, value)))
            .collect::<Result<Vec<_>, NacError>>()?
    };

    let mut nac: Array2<T> = Array2::zeros((n_bands, n_bands));
    for (i, j, value) in couplings.into_iter() {
        nac[[i, j]] = value;
        nac[[j, i]] = -value;
    }

    let energies: Array1<f64> = wave_a
        .energies()
        .slice(s![params.ispin - 1, params.ikpt - 1, ..])
        .to_owned();

    // finite difference normalization
    let nac: Array2<T> = nac.mapv(|value| value / (2.0 * params.dt));

    if let Ok(max) = nac.mapv(|value| value.magnitude()).max() {
        info!("largest |NAC| between <{}> and <{}>: {:e}", wave_a.name(), wave_b.name(), max);
    }
    Ok(NacOutput { energies, nac })
}

/// Opens the WAVECARs at t (`path_a`) and t + dt (`path_b`) and computes the NACs between
/// their bands. Both files are closed before the function returns, also on errors.
pub fn nac_from_wavecars<T, P, Q>(
    path_a: P,
    path_b: Q,
    params: &NacParameters,
) -> Result<NacOutput<T>, NacError>
where
    T: CouplingElement,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    info!(
        "Calculating NACs between <{}> and <{}>",
        path_a.as_ref().display(),
        path_b.as_ref().display()
    );
    // wavecar at t
    let wave_a = Wavecar::open(path_a)?;
    // wavecar at t + dt
    let wave_b = Wavecar::open(path_b)?;

    nac_from_sources(&wave_a, &wave_b, params)
}

/// Same as [nac_from_wavecars], the element type is chosen from the gamma flag:
/// real couplings for gamma-only WAVECARs, complex couplings otherwise.
pub fn nac_from_wavecars_gamma<P, Q>(
    path_a: P,
    path_b: Q,
    gamma: bool,
    params: &NacParameters,
) -> Result<NacMatrixKind, NacError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if gamma {
        nac_from_wavecars::<f64, P, Q>(path_a, path_b, params).map(NacMatrixKind::Real)
    } else {
        nac_from_wavecars::<c64, P, Q>(path_a, path_b, params).map(NacMatrixKind::Complex)
    }
}

/// Overlap integrals are only defined between coefficient vectors of the same length and
/// meaning, so both snapshots need the same bands and plane waves at the selected k-point.
fn check_compatibility<A, B>(wave_a: &A, wave_b: &B, params: &NacParameters) -> Result<(), NacError>
where
    A: WavefunctionSource,
    B: WavefunctionSource,
{
    if !(params.dt.is_finite() && params.dt > 0.0) {
        return Err(NacError::InvalidTimeStep(params.dt));
    }
    check_selector("spin", params.ispin, wave_a.n_spins().min(wave_b.n_spins()))?;
    check_selector("k-point", params.ikpt, wave_a.n_kpoints().min(wave_b.n_kpoints()))?;

    if wave_a.n_bands() != wave_b.n_bands() {
        return Err(NacError::StructuralMismatch {
            what: "bands",
            a: wave_a.n_bands(),
            b: wave_b.n_bands(),
        });
    }
    let n_plane_waves: usize = wave_a.n_plane_waves(params.ikpt);
    if n_plane_waves != wave_b.n_plane_waves(params.ikpt) {
        return Err(NacError::StructuralMismatch {
            what: "nplws",
            a: n_plane_waves,
            b: wave_b.n_plane_waves(params.ikpt),
        });
    }
    debug!(
        "{} bands with {} plane waves at k-point {}, spin {}",
        wave_a.n_bands(),
        n_plane_waves,
        params.ikpt,
        params.ispin
    );
    Ok(())
}

/// Coupling of the bands i and j (0-based) before the division by 2 dt.
fn pair_coupling<T, A, B>(
    wave_a: &A,
    wave_b: &B,
    i: usize,
    j: usize,
    params: &NacParameters,
) -> Result<T, NacError>
where
    T: CouplingElement,
    A: WavefunctionSource,
    B: WavefunctionSource,
{
    let n_plane_waves: usize = wave_a.n_plane_waves(params.ikpt);
    let ci_t: Array1<c64> = read_band(wave_a, i, n_plane_waves, params)?;
    let cj_t: Array1<c64> = read_band(wave_a, j, n_plane_waves, params)?;
    let ci_tdt: Array1<c64> = read_band(wave_b, i, n_plane_waves, params)?;
    let cj_tdt: Array1<c64> = read_band(wave_b, j, n_plane_waves, params)?;

    let forward: c64 = overlap(ci_t.view(), cj_tdt.view());
    let backward: c64 = overlap(cj_t.view(), ci_tdt.view());
    trace!("bands {} {}: <i(t)|j(t+dt)> = {}, <j(t)|i(t+dt)> = {}", i, j, forward, backward);

    Ok(T::from_overlap(forward - backward))
}

/// Normalized coefficients of the 0-based band at the selected spin and k-point.
fn read_band<W: WavefunctionSource>(
    wave: &W,
    band: usize,
    n_plane_waves: usize,
    params: &NacParameters,
) -> Result<Array1<c64>, NacError> {
    let coefficients: Array1<c64> =
        wave.read_band_coefficients(params.ispin, params.ikpt, band + 1)?;
    if coefficients.len() != n_plane_waves {
        return Err(NacError::StructuralMismatch {
            what: "coefficients",
            a: n_plane_waves,
            b: coefficients.len(),
        });
    }
    Ok(coefficients)
}
