use crate::c64;
use crate::coupling::normalize;
use crate::defaults::{WAVECAR_RTAG_DOUBLE, WAVECAR_RTAG_SINGLE};
use crate::errors::NacError;
use crate::interface::WavefunctionSource;
use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use ndarray::prelude::*;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

/// Storage precision of the plane-wave coefficients, given by the record tag of the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavecarPrecision {
    /// `complex(4)`, record tag 45200
    Single,
    /// `complex(8)`, record tag 45210
    Double,
}

impl WavecarPrecision {
    fn from_rtag(rtag: u64) -> Option<Self> {
        match rtag {
            WAVECAR_RTAG_SINGLE => Some(WavecarPrecision::Single),
            WAVECAR_RTAG_DOUBLE => Some(WavecarPrecision::Double),
            _ => None,
        }
    }

    /// Bytes of one complex coefficient.
    pub fn coefficient_size(&self) -> usize {
        match self {
            WavecarPrecision::Single => 8,
            WavecarPrecision::Double => 16,
        }
    }
}

/// Reader for the binary WAVECAR file of VASP.
///
/// The file consists of records of fixed length `recl`. Record 0 holds the record length,
/// the number of spins and the precision tag, record 1 the number of k-points and bands,
/// the cutoff energy and the lattice vectors. For every spin and k-point follows one
/// record with the number of plane waves, the k-vector, the band energies and the
/// occupations, and then one record of coefficients per band.
///
/// The headers are parsed when the file is opened, coefficients are read on request.
/// The file is closed when the reader is dropped.
pub struct Wavecar<R> {
    name: String,
    reader: Mutex<R>,
    record_length: u64,
    precision: WavecarPrecision,
    n_spins: usize,
    n_kpoints: usize,
    n_bands: usize,
    encut: f64,
    lattice: Array2<f64>,
    n_plane_waves: Vec<usize>,
    kvecs: Array2<f64>,
    energies: Array3<f64>,
    occupations: Array3<f64>,
}

impl Wavecar<BufReader<File>> {
    /// Opens a WAVECAR file and reads all headers.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NacError> {
        let name: String = path.as_ref().display().to_string();
        let file: File = File::open(path.as_ref()).map_err(|err| NacError::source_read(&name, err))?;
        Self::from_reader(name, BufReader::new(file))
    }
}

impl<R: Read + Seek> Wavecar<R> {
    /// Reads the headers of a WAVECAR from any seekable reader.
    pub fn from_reader<S: Into<String>>(name: S, mut reader: R) -> Result<Self, NacError> {
        let name: String = name.into();
        let io_err = |err: io::Error| NacError::source_read(name.as_str(), err);

        // record 0: record length, number of spins, precision tag
        reader.seek(SeekFrom::Start(0)).map_err(io_err)?;
        let mut dump: [f64; 3] = [0.0; 3];
        reader
            .read_f64_into::<LittleEndian>(&mut dump)
            .map_err(io_err)?;
        let record_length: usize = as_count(&name, "record length", dump[0])?;
        let n_spins: usize = as_count(&name, "spins", dump[1])?;
        let rtag: usize = as_count(&name, "record tag", dump[2])?;
        let precision: WavecarPrecision = WavecarPrecision::from_rtag(rtag as u64).ok_or_else(|| {
            NacError::format(
                name.as_str(),
                format!("unsupported record tag {}, only 45200 and 45210 are known", rtag),
            )
        })?;
        if record_length < 12 * 8 {
            return Err(NacError::format(
                name.as_str(),
                format!("record length {} is too short", record_length),
            ));
        }
        let record_length: u64 = record_length as u64;

        // record 1: number of k-points and bands, cutoff, lattice vectors
        reader
            .seek(SeekFrom::Start(record_length))
            .map_err(io_err)?;
        let mut dump: [f64; 12] = [0.0; 12];
        reader
            .read_f64_into::<LittleEndian>(&mut dump)
            .map_err(io_err)?;
        let n_kpoints: usize = as_count(&name, "k-points", dump[0])?;
        let n_bands: usize = as_count(&name, "bands", dump[1])?;
        let encut: f64 = dump[2];
        let lattice: Array2<f64> = Array::from_shape_vec((3, 3), dump[3..].to_vec())
            .map_err(|err| NacError::format(name.as_str(), err.to_string()))?;
        if n_spins == 0 || n_kpoints == 0 || n_bands == 0 {
            return Err(NacError::format(
                name.as_str(),
                format!(
                    "empty wavefunction: {} spins, {} k-points, {} bands",
                    n_spins, n_kpoints, n_bands
                ),
            ));
        }
        let too_large = |what: &str| {
            NacError::format(
                name.as_str(),
                format!(
                    "{} spins, {} k-points and {} bands overflow the {}",
                    n_spins, n_kpoints, n_bands, what
                ),
            )
        };
        let header_size: u64 = n_bands
            .checked_mul(3)
            .and_then(|n| n.checked_add(4))
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| too_large("band header"))? as u64;
        if header_size > record_length {
            return Err(NacError::format(
                name.as_str(),
                format!("{} bands do not fit into records of {} bytes", n_bands, record_length),
            ));
        }
        // n_bands < record_length / 24, so the block size can not overflow
        let block: u64 = n_bands as u64 + 1;
        let n_blocks: u64 = (n_spins as u64)
            .checked_mul(n_kpoints as u64)
            .ok_or_else(|| too_large("block count"))?;
        n_blocks
            .checked_mul(block)
            .and_then(|n| n.checked_add(2))
            .and_then(|n| n.checked_mul(record_length))
            .ok_or_else(|| too_large("file size"))?;

        // all band headers have to be inside the stream before anything is allocated,
        // truncated coefficient records are only detected when they are read
        let stream_length: u64 = reader.seek(SeekFrom::End(0)).map_err(io_err)?;
        let last_header_end: u64 = (2 + (n_blocks - 1) * block) * record_length + header_size;
        if last_header_end > stream_length {
            return Err(NacError::format(
                name.as_str(),
                format!(
                    "{} spins, {} k-points and {} bands need at least {} bytes, the file has {}",
                    n_spins, n_kpoints, n_bands, last_header_end, stream_length
                ),
            ));
        }

        let mut wavecar: Wavecar<R> = Wavecar {
            name,
            reader: Mutex::new(reader),
            record_length,
            precision,
            n_spins,
            n_kpoints,
            n_bands,
            encut,
            lattice,
            n_plane_waves: vec![0; n_kpoints],
            kvecs: Array2::zeros((n_kpoints, 3)),
            energies: Array3::zeros((n_spins, n_kpoints, n_bands)),
            occupations: Array3::zeros((n_spins, n_kpoints, n_bands)),
        };
        wavecar.read_band_headers()?;
        debug!(
            "WAVECAR <{}>: {} spins, {} k-points, {} bands, ENCUT = {} eV, {:?} precision",
            wavecar.name, n_spins, n_kpoints, n_bands, encut, precision
        );
        Ok(wavecar)
    }

    // the plane wave counts and k-vectors are taken from the first spin channel
    fn read_band_headers(&mut self) -> Result<(), NacError> {
        let n_bands: usize = self.n_bands;
        let mut dump: Vec<f64> = vec![0.0; 4 + 3 * n_bands];
        for ispin in 1..=self.n_spins {
            for ikpt in 1..=self.n_kpoints {
                let offset: u64 = (self.record_index(ispin, ikpt, 1) - 1) * self.record_length;
                {
                    let reader: &mut R = self
                        .reader
                        .get_mut()
                        .map_err(|_| poisoned(&self.name))?;
                    reader
                        .seek(SeekFrom::Start(offset))
                        .and_then(|_| reader.read_f64_into::<LittleEndian>(&mut dump))
                        .map_err(|err| NacError::source_read(self.name.as_str(), err))?;
                }
                if ispin == 1 {
                    let n_plane_waves: usize = as_count(&self.name, "plane waves", dump[0])?;
                    let record_size: Option<u64> = n_plane_waves
                        .checked_mul(self.precision.coefficient_size())
                        .map(|size| size as u64);
                    if record_size.map_or(true, |size| size > self.record_length) {
                        return Err(NacError::format(
                            self.name.as_str(),
                            format!(
                                "{} plane waves do not fit into records of {} bytes",
                                n_plane_waves, self.record_length
                            ),
                        ));
                    }
                    self.n_plane_waves[ikpt - 1] = n_plane_waves;
                    self.kvecs
                        .slice_mut(s![ikpt - 1, ..])
                        .assign(&aview1(&dump[1..4]));
                }
                for band in 0..n_bands {
                    self.energies[[ispin - 1, ikpt - 1, band]] = dump[4 + 3 * band];
                    self.occupations[[ispin - 1, ikpt - 1, band]] = dump[4 + 3 * band + 2];
                }
            }
        }
        Ok(())
    }

    /// Record number of a band, all indices starting from 1. The band header of a
    /// spin/k-point block sits one record before its first band.
    fn record_index(&self, ispin: usize, ikpt: usize, iband: usize) -> u64 {
        let block: usize = self.n_bands + 1;
        (2 + (ispin - 1) * self.n_kpoints * block + (ikpt - 1) * block + iband) as u64
    }

    /// Plane-wave coefficients of a band as stored in the file, without normalization.
    pub fn read_band_coefficients_raw(
        &self,
        ispin: usize,
        ikpt: usize,
        iband: usize,
    ) -> Result<Array1<c64>, NacError> {
        self.check_index(ispin, ikpt, iband)?;
        let n_plane_waves: usize = self.n_plane_waves[ikpt - 1];
        let offset: u64 = self.record_index(ispin, ikpt, iband) * self.record_length;

        let mut guard = self.reader.lock().map_err(|_| poisoned(&self.name))?;
        let reader: &mut R = &mut *guard;
        let io_err = |err: io::Error| NacError::source_read(self.name.as_str(), err);
        reader.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let coefficients: Array1<c64> = match self.precision {
            WavecarPrecision::Single => {
                let mut dump: Vec<f32> = vec![0.0; 2 * n_plane_waves];
                reader
                    .read_f32_into::<LittleEndian>(&mut dump)
                    .map_err(io_err)?;
                dump.chunks_exact(2)
                    .map(|pair| c64::new(pair[0] as f64, pair[1] as f64))
                    .collect()
            }
            WavecarPrecision::Double => {
                let mut dump: Vec<f64> = vec![0.0; 2 * n_plane_waves];
                reader
                    .read_f64_into::<LittleEndian>(&mut dump)
                    .map_err(io_err)?;
                dump.chunks_exact(2)
                    .map(|pair| c64::new(pair[0], pair[1]))
                    .collect()
            }
        };
        Ok(coefficients)
    }

    pub fn precision(&self) -> WavecarPrecision {
        self.precision
    }

    /// Plane-wave cutoff in eV.
    pub fn encut(&self) -> f64 {
        self.encut
    }

    /// Real-space lattice vectors (rows) in Angstrom.
    pub fn lattice(&self) -> ArrayView2<f64> {
        self.lattice.view()
    }

    /// k-vectors in fractional coordinates of the reciprocal lattice.
    pub fn kvecs(&self) -> ArrayView2<f64> {
        self.kvecs.view()
    }

    /// Band occupations `[spin, kpoint, band]`.
    pub fn occupations(&self) -> ArrayView3<f64> {
        self.occupations.view()
    }
}

impl<R: Read + Seek> WavefunctionSource for Wavecar<R> {
    fn n_spins(&self) -> usize {
        self.n_spins
    }

    fn n_kpoints(&self) -> usize {
        self.n_kpoints
    }

    fn n_bands(&self) -> usize {
        self.n_bands
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
        Ok(normalize(self.read_band_coefficients_raw(ispin, ikpt, iband)?))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// The header stores integers as doubles.
fn as_count(name: &str, what: &str, value: f64) -> Result<usize, NacError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(NacError::format(
            name,
            format!("number of {} is not a count: {}", what, value),
        ));
    }
    Ok(value as usize)
}

fn poisoned(name: &str) -> NacError {
    NacError::source_read(
        name,
        io::Error::new(io::ErrorKind::Other, "reader lock poisoned"),
    )
}
