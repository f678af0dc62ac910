use crate::coupling::NacParameters;
use crate::defaults::*;
use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_verbose() -> i8 {
    VERBOSE
}
fn default_gamma() -> bool {
    GAMMA
}
fn default_dt() -> f64 {
    DT
}
fn default_ikpt() -> usize {
    IKPT
}
fn default_ispin() -> usize {
    ISPIN
}
fn default_parallel() -> bool {
    PARALLEL
}
fn default_eig_file_name() -> String {
    String::from(EIG_FILE_NAME)
}
fn default_nac_file_name() -> String {
    String::from(NAC_FILE_NAME)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NacConfiguration {
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default = "default_gamma")]
    pub gamma: bool,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_ikpt")]
    pub ikpt: usize,
    #[serde(default = "default_ispin")]
    pub ispin: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default = "default_eig_file_name")]
    pub eig_file_name: String,
    #[serde(default = "default_nac_file_name")]
    pub nac_file_name: String,
}

impl Default for NacConfiguration {
    fn default() -> Self {
        NacConfiguration {
            verbose: VERBOSE,
            gamma: GAMMA,
            dt: DT,
            ikpt: IKPT,
            ispin: ISPIN,
            parallel: PARALLEL,
            eig_file_name: default_eig_file_name(),
            nac_file_name: default_nac_file_name(),
        }
    }
}

impl NacConfiguration {
    /// Reads the configuration file of the working directory. If it does not exist
    /// the default settings are used and written to the directory.
    pub fn new() -> Result<Self> {
        Self::from_path(CONFIG_FILE_NAME)
    }

    /// Reads the configuration from `path`; missing keys take their default values.
    /// A missing file is created with the complete configuration so that the user can
    /// see all the used options.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_file_path: &Path = path.as_ref();
        let config_string: String = if config_file_path.exists() {
            fs::read_to_string(config_file_path).with_context(|| {
                format!("Unable to read config file {}", config_file_path.display())
            })?
        } else {
            String::from("")
        };
        let config: Self = Self::from_toml(&config_string)
            .with_context(|| format!("Invalid config file {}", config_file_path.display()))?;

        if !config_file_path.exists() {
            let config_string: String = toml::to_string(&config)?;
            fs::write(config_file_path, config_string).with_context(|| {
                format!("Unable to write config file {}", config_file_path.display())
            })?;
        }
        Ok(config)
    }

    pub fn from_toml(config_string: &str) -> Result<Self> {
        let config: Self = toml::from_str(config_string)?;
        Ok(config)
    }

    pub fn parameters(&self) -> NacParameters {
        NacParameters::new(self.dt, self.ikpt, self.ispin).with_parallel(self.parallel)
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            2 => LevelFilter::Trace,
            1 => LevelFilter::Debug,
            0 => LevelFilter::Info,
            -1 => LevelFilter::Warn,
            -2 => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_the_defaults() {
        let config: NacConfiguration = NacConfiguration::from_toml("").unwrap();
        assert_eq!(config, NacConfiguration::default());
        assert_eq!(config.parameters(), NacParameters::default());
    }

    #[test]
    fn missing_keys_take_default_values() {
        let config: NacConfiguration =
            NacConfiguration::from_toml("gamma = false\ndt = 0.5\nispin = 2\n").unwrap();
        assert!(!config.gamma);
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.ispin, 2);
        assert_eq!(config.ikpt, IKPT);
        assert_eq!(config.nac_file_name, "nac.txt");

        let params: NacParameters = config.parameters();
        assert_eq!(params, NacParameters::new(0.5, 1, 2).with_parallel(PARALLEL));
    }

    #[test]
    fn wrong_types_are_reported() {
        assert!(NacConfiguration::from_toml("dt = \"fast\"").is_err());
    }

    #[test]
    fn verbosity_maps_to_log_levels() {
        let mut config: NacConfiguration = NacConfiguration::default();
        assert_eq!(config.log_level(), LevelFilter::Info);
        config.verbose = 2;
        assert_eq!(config.log_level(), LevelFilter::Trace);
        config.verbose = -2;
        assert_eq!(config.log_level(), LevelFilter::Error);
    }

    #[test]
    fn missing_file_is_written_with_all_options() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config: NacConfiguration = NacConfiguration::from_path(&path).unwrap();
        assert_eq!(config, NacConfiguration::default());
        let written: String = fs::read_to_string(&path).unwrap();
        assert!(written.contains("gamma = true"));
        assert!(written.contains("nac_file_name = \"nac.txt\""));
        assert_eq!(NacConfiguration::from_path(&path).unwrap(), config);
    }
}
