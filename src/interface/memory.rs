use crate::c64;
use crate::coupling::normalize;
use crate::errors::NacError;
use crate::interface::WavefunctionSource;
use ndarray::prelude::*;

/// Snapshot whose plane-wave coefficients are already held in memory.
#[derive(Clone, Debug)]
pub struct MemorySnapshot {
    pub name: String,
    energies: Array3<f64>,
    // [spin][kpoint][band]
    coefficients: Vec<Vec<Vec<Array1<c64>>>>,
    n_plane_waves: Vec<usize>,
}

impl MemorySnapshot {
    /// Creates a snapshot from the energy table `[spin, kpoint, band]` and the coefficients
    /// `[spin][kpoint][band]`. Every band of a k-point needs the same number of plane waves
    /// in all spin channels.
    pub fn new<S: Into<String>>(
        name: S,
        energies: Array3<f64>,
        coefficients: Vec<Vec<Vec<Array1<c64>>>>,
    ) -> Result<Self, NacError> {
        let (n_spins, n_kpoints, n_bands) = energies.dim();
        if coefficients.len() != n_spins {
            return Err(NacError::StructuralMismatch {
                what: "spins",
                a: n_spins,
                b: coefficients.len(),
            });
        }
        let mut n_plane_waves: Vec<usize> = Vec::with_capacity(n_kpoints);
        for spin in coefficients.iter() {
            if spin.len() != n_kpoints {
                return Err(NacError::StructuralMismatch {
                    what: "kpoints",
                    a: n_kpoints,
                    b: spin.len(),
                });
            }
            for (kpoint, bands) in spin.iter().enumerate() {
                if bands.len() != n_bands {
                    return Err(NacError::StructuralMismatch {
                        what: "bands",
                        a: n_bands,
                        b: bands.len(),
                    });
                }
                for band in bands.iter() {
                    if n_plane_waves.len() == kpoint {
                        n_plane_waves.push(band.len());
                    } else if n_plane_waves[kpoint] != band.len() {
                        return Err(NacError::StructuralMismatch {
                            what: "nplws",
                            a: n_plane_waves[kpoint],
                            b: band.len(),
                        });
                    }
                }
            }
        }
        // a snapshot without bands still reports its k-points
        n_plane_waves.resize(n_kpoints, 0);

        Ok(MemorySnapshot {
            name: name.into(),
            energies,
            coefficients,
            n_plane_waves,
        })
    }

    /// Snapshot with a single spin channel and a single k-point.
    pub fn single_kpoint<S: Into<String>>(
        name: S,
        energies: Array1<f64>,
        bands: Vec<Array1<c64>>,
    ) -> Result<Self, NacError> {
        let n_bands: usize = energies.len();
        let energies: Array3<f64> = energies
            .into_shape((1, 1, n_bands))
            .map_err(|err| NacError::format("memory", err.to_string()))?;
        Self::new(name, energies, vec![vec![bands]])
    }
}

impl WavefunctionSource for MemorySnapshot {
    fn n_spins(&self) -> usize {
        self.energies.dim().0
    }

    fn n_kpoints(&self) -> usize {
        self.energies.dim().1
    }

    fn n_bands(&self) -> usize {
        self.energies.dim().2
    }

    fn n_plane_waves(&self, ikpt: usize) -> usize {
        ikpt.checked_sub(1)
            .and_then(|k| self.n_plane_waves.get(k))
            .copied()
            .unwrap_or(0)
    }

    fn energies(&self) -> ArrayView3<f64> {
        self.energies.view()
    }

    fn read_band_coefficients(
        &self,
        ispin: usize,
        ikpt: usize,
        iband: usize,
    ) -> Result<Array1<c64>, NacError> {
        self.check_index(ispin, ikpt, iband)?;
        let coefficients: Array1<c64> =
            self.coefficients[ispin - 1][ikpt - 1][iband - 1].clone();
        Ok(normalize(coefficients))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
