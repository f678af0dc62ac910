use crate::coupling::{nac_from_wavecars_gamma, NacMatrixKind, NacParameters};
use crate::initialization::NacConfiguration;
use crate::output::write_output_kind;
use anyhow::{bail, Context, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Computes the NACs of all consecutive snapshot pairs of a trajectory. The energies and
/// couplings of the pair (k, k + 1) are written next to the snapshot k.
/// Returns the number of processed pairs.
pub fn run_trajectory<P: AsRef<Path>>(wavecars: &[P], config: &NacConfiguration) -> Result<usize> {
    if wavecars.len() < 2 {
        bail!(
            "at least two snapshots are needed to compute NACs, got {}",
            wavecars.len()
        );
    }
    let params: NacParameters = config.parameters();
    let timer: Instant = Instant::now();

    for (step, pair) in wavecars.windows(2).enumerate() {
        let (wave_a, wave_b): (&Path, &Path) = (pair[0].as_ref(), pair[1].as_ref());
        let output: NacMatrixKind = nac_from_wavecars_gamma(wave_a, wave_b, config.gamma, &params)
            .with_context(|| {
                format!(
                    "NAC calculation between <{}> and <{}> failed",
                    wave_a.display(),
                    wave_b.display()
                )
            })?;

        let directory: PathBuf = output_directory(wave_a);
        let eig_path: PathBuf = directory.join(&config.eig_file_name);
        let nac_path: PathBuf = directory.join(&config.nac_file_name);
        write_output_kind(&eig_path, &nac_path, &output)
            .with_context(|| format!("Unable to write the results to {}", directory.display()))?;
        info!(
            "step {:>5}: {} bands written to {}",
            step + 1,
            output.n_bands(),
            nac_path.display()
        );
    }
    info!(
        "{} snapshot pairs done in {:.2} s",
        wavecars.len() - 1,
        timer.elapsed().as_secs_f64()
    );
    Ok(wavecars.len() - 1)
}

fn output_directory(wavecar: &Path) -> PathBuf {
    match wavecar.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c64;
    use crate::defaults::WAVECAR_RTAG_SINGLE;
    use crate::interface::wavecar::tests::{synthetic_wavecar, Block};
    use num_traits::Zero;
    use std::fs;
    use tempfile::tempdir;

    fn snapshot(angle: f64) -> Vec<u8> {
        let block = Block {
            energies: vec![-3.0 + angle, 2.0 - angle],
            coefficients: vec![
                vec![c64::from(angle.cos()), c64::from(angle.sin()), c64::zero()],
                vec![c64::from(-angle.sin()), c64::from(angle.cos()), c64::zero()],
            ],
        };
        synthetic_wavecar(WAVECAR_RTAG_SINGLE, &[vec![block]])
    }

    #[test]
    fn trajectory_pairs_are_written_next_to_the_first_snapshot() {
        let scratch = tempdir().unwrap();
        let root: &Path = scratch.path();
        let mut wavecars: Vec<PathBuf> = Vec::new();
        for step in 0..3 {
            let dir: PathBuf = root.join(format!("{:03}", step + 1));
            fs::create_dir_all(&dir).unwrap();
            let path: PathBuf = dir.join("WAVECAR");
            fs::write(&path, snapshot(0.1 * step as f64)).unwrap();
            wavecars.push(path);
        }

        let config: NacConfiguration = NacConfiguration::default();
        assert_eq!(run_trajectory(&wavecars, &config).unwrap(), 2);

        for step in 0..2 {
            let dir: PathBuf = root.join(format!("{:03}", step + 1));
            let eig: String = fs::read_to_string(dir.join("eig.txt")).unwrap();
            assert_eq!(eig.lines().count(), 2);
            let nac: String = fs::read_to_string(dir.join("nac.txt")).unwrap();
            let rows: Vec<Vec<f64>> = nac
                .lines()
                .map(|line| line.split(' ').map(|val| val.parse().unwrap()).collect())
                .collect();
            // a rotation by 0.1 rad between the snapshots: (sin(0.1) + sin(0.1)) / 2
            assert!((rows[1][0] - 0.1_f64.sin()).abs() < 1e-6);
            assert_eq!(rows[0][1], -rows[1][0]);
        }
        assert!(!root.join("003").join("nac.txt").exists());
    }

    #[test]
    fn a_single_snapshot_is_not_a_trajectory() {
        let config: NacConfiguration = NacConfiguration::default();
        assert!(run_trajectory(&["WAVECAR"], &config).is_err());
    }

    #[test]
    fn missing_snapshot_names_the_failing_pair() {
        let config: NacConfiguration = NacConfiguration::default();
        let error = run_trajectory(&["missing/001/WAVECAR", "missing/002/WAVECAR"], &config)
            .unwrap_err();
        assert!(error.to_string().contains("missing/001/WAVECAR"));
    }
}
