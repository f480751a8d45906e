use crate::cli::LoadArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use molstore::core::config::ConnectivityConfig;
use molstore::core::io::LoadOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialConnectivityConfig {
    #[serde(rename = "search-radius")]
    search_radius: Option<f64>,
    #[serde(rename = "fallback-radius")]
    fallback_radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialLoadConfig {
    #[serde(rename = "alt-loc")]
    alt_loc: Option<char>,
    #[serde(rename = "read-model")]
    read_model: Option<Vec<isize>>,
    #[serde(rename = "read-mol")]
    read_mol: Option<Vec<usize>>,
}

/// The configuration file as written, before command line overrides are applied.
///
/// ```toml
/// [connectivity]
/// search-radius = 1.2
/// fallback-radius = 2.0
///
/// [load]
/// alt-loc = "A"
/// read-model = [1, 2]
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    connectivity: Option<PartialConnectivityConfig>,
    load: Option<PartialLoadConfig>,
}

/// Everything a command needs to load its input structure.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub load: LoadOptions,
    pub connectivity: ConnectivityConfig,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the config file named by `args`, if any, and merges it with the command line.
    pub fn resolve(args: &LoadArgs) -> Result<AppConfig> {
        let partial = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        partial.merge_with_cli(args)
    }

    /// Command line values win over the file, and the file wins over the defaults.
    pub fn merge_with_cli(mut self, args: &LoadArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let conn = self.connectivity.take().unwrap_or_default();
        let load = self.load.take().unwrap_or_default();
        let defaults = ConnectivityConfig::default();

        let connectivity = ConnectivityConfig {
            search_radius: args
                .search_radius
                .or(conn.search_radius)
                .unwrap_or(defaults.search_radius),
            fallback_radius: args
                .fallback_radius
                .or(conn.fallback_radius)
                .unwrap_or(defaults.fallback_radius),
        };
        connectivity
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let load = LoadOptions {
            read_model: args.read_model.clone().or(load.read_model),
            read_mol: args.read_mol.clone().or(load.read_mol),
            alt_loc: args.alt_loc.or(load.alt_loc),
            ..Default::default()
        };

        Ok(AppConfig {
            input_path: args.input.clone(),
            load,
            connectivity,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "connectivity.search-radius" => {
                    self.connectivity
                        .get_or_insert_with(Default::default)
                        .search_radius = Some(parse_setting(key, value)?);
                }
                "connectivity.fallback-radius" => {
                    self.connectivity
                        .get_or_insert_with(Default::default)
                        .fallback_radius = Some(parse_setting(key, value)?);
                }
                "load.alt-loc" => {
                    self.load.get_or_insert_with(Default::default).alt_loc =
                        Some(parse_setting(key, value)?);
                }
                "load.read-model" => {
                    self.load.get_or_insert_with(Default::default).read_model =
                        Some(parse_setting_list(key, value)?);
                }
                "load.read-mol" => {
                    self.load.get_or_insert_with(Default::default).read_mol =
                        Some(parse_setting_list(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_setting_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(|item| parse_setting(key, item.trim()))
        .collect()
}
