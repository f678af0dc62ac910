use crate::coupling::{format_float, CouplingElement, NacMatrixKind, NacOutput};
use ndarray::prelude::*;
use std::fs;
use std::io;
use std::path::Path;

/// Writes one energy per line.
pub fn write_energies<P: AsRef<Path>>(path: P, energies: ArrayView1<f64>) -> io::Result<()> {
    let mut string: String = String::new();
    for energy in energies.iter() {
        string.push_str(&format_float(*energy));
        string.push('\n');
    }
    fs::write(path, string)
}

/// Writes the NAC matrix row by row, the entries of a row are separated by a space.
pub fn write_nac<T: CouplingElement, P: AsRef<Path>>(path: P, nac: ArrayView2<T>) -> io::Result<()> {
    let mut string: String = String::new();
    for row in nac.outer_iter() {
        let line: Vec<String> = row.iter().map(|value| value.format_entry()).collect();
        string.push_str(&line.join(" "));
        string.push('\n');
    }
    fs::write(path, string)
}

/// Writes the energies and the NAC matrix of one snapshot pair.
pub fn write_output<T: CouplingElement, P: AsRef<Path>, Q: AsRef<Path>>(
    eig_path: P,
    nac_path: Q,
    output: &NacOutput<T>,
) -> io::Result<()> {
    write_energies(eig_path, output.energies.view())?;
    write_nac(nac_path, output.nac.view())
}

pub fn write_output_kind<P: AsRef<Path>, Q: AsRef<Path>>(
    eig_path: P,
    nac_path: Q,
    output: &NacMatrixKind,
) -> io::Result<()> {
    match output {
        NacMatrixKind::Real(output) => write_output(eig_path, nac_path, output),
        NacMatrixKind::Complex(output) => write_output(eig_path, nac_path, output),
    }
}
