pub mod atoms;
pub mod convert;
pub mod info;
pub mod vectors;

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use molstore::core::models::ensemble::Ensemble;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// The coordinate file formats the CLI reads and writes, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Pdb,
    Xyz,
}

impl StructureFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdb" | "ent") => Ok(Self::Pdb),
            Some("xyz") => Ok(Self::Xyz),
            _ => Err(CliError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Loads the configured input file into a fresh ensemble.
pub fn load_ensemble(config: &AppConfig) -> Result<Ensemble> {
    let path = &config.input_path;
    let format = StructureFormat::from_path(path)?;
    let mut ensemble = Ensemble::with_config(config.connectivity);

    info!(path = ?path, ?format, "Loading structure.");
    match format {
        StructureFormat::Pdb => ensemble.load_pdb(path, &config.load)?,
        StructureFormat::Xyz => ensemble.load_xyz(path, &config.load)?,
    }

    if ensemble.is_empty() {
        warn!("No atoms were loaded from {:?}.", path);
    } else {
        info!(
            models = ensemble.num_models(),
            molecules = ensemble.num_molecules(),
            "Structure loaded."
        );
    }
    Ok(ensemble)
}

/// A buffered writer for `path`, or for standard output.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
