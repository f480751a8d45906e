use molstore::core::io::pdb::PdbError;
use molstore::core::io::xyz::XyzError;
use molstore::core::models::error::StructureError;
use molstore::query::export::ExportError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pdb(#[from] PdbError),

    #[error(transparent)]
    Xyz(#[from] XyzError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cannot tell the file format of '{path}' (expected a .pdb, .ent or .xyz extension)", path = .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
