// config file
pub const CONFIG_FILE_NAME: &str = "nac.toml";
// print level
pub const VERBOSE: i8 = 0;
// gamma-only wavefunctions: the couplings are real
pub const GAMMA: bool = true;
// ionic time step between two snapshots in fs
pub const DT: f64 = 1.0;
// k-point and spin channel, starting from 1
pub const IKPT: usize = 1;
pub const ISPIN: usize = 1;
// evaluate the band pairs on the rayon thread pool
pub const PARALLEL: bool = true;
// output files, written next to the first snapshot of each pair
pub const EIG_FILE_NAME: &str = "eig.txt";
pub const NAC_FILE_NAME: &str = "nac.txt";
// record tags of the WAVECAR header: single and double precision coefficients
pub const WAVECAR_RTAG_SINGLE: u64 = 45200;
pub const WAVECAR_RTAG_DOUBLE: u64 = 45210;
