use anyhow::Result;
use clap::{crate_name, crate_version, App, Arg};
use env_logger::Builder;
use log::{error, info};
use rusty_nac::defaults::CONFIG_FILE_NAME;
use rusty_nac::driver::run_trajectory;
use rusty_nac::initialization::NacConfiguration;
use std::io::Write;
use std::path::PathBuf;
use std::process;

fn main() {
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("nonadiabatic couplings between the bands of consecutive WAVECAR snapshots")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("Sets the configuration file to use"),
        )
        .arg(
            Arg::new("WAVECAR")
                .help("WAVECAR files of the trajectory in chronological order")
                .required(true)
                .multiple_values(true)
                .min_values(2)
                .index(1),
        )
        .get_matches();

    // read the configuration file, if it does not exist in the directory
    // the default settings are written to it
    let config_file: &str = matches.value_of("config").unwrap_or(CONFIG_FILE_NAME);
    let config: NacConfiguration = match NacConfiguration::from_path(config_file) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:?}", err);
            process::exit(1);
        }
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, config.log_level())
        .init();

    let wavecars: Vec<PathBuf> = matches
        .values_of("WAVECAR")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();

    if let Err(err) = run(&wavecars, &config) {
        error!("{:?}", err);
        process::exit(1);
    }
}

fn run(wavecars: &[PathBuf], config: &NacConfiguration) -> Result<()> {
    info!(
        "gamma: {}, dt: {} fs, k-point: {}, spin: {}",
        config.gamma, config.dt, config.ikpt, config.ispin
    );
    let n_pairs: usize = run_trajectory(wavecars, config)?;
    info!("NACs of {} snapshot pairs written", n_pairs);
    Ok(())
}
