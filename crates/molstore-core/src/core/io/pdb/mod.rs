//! PDB coordinate files.
//!
//! Decoding covers the coordinate section (MODEL/ENDMDL, ATOM, HETATM, TER), CONECT records and the
//! END/MASTER terminators; every other record is ignored. Encoding regenerates a complete file with
//! REMARK, HET, HETNAM, FORMUL, coordinate, CONECT, MASTER and END records.

mod loader;
pub mod records;
pub mod segment;
mod writer;

pub use writer::Heterogen;

use crate::core::io::LoadOptions;
use crate::core::io::traits::StructureFile;
use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("The PDB input contains no lines")]
    EmptyInput,
    #[error("The MODEL record on line {line} is corrupt, cannot read the PDB file: '{record}'")]
    CorruptModelRecord { line: usize, record: String },
    #[error(
        "Multiple alternate location indicators are present (line {line}), but the desired coordinate set has not been specified"
    )]
    AltLocUnspecified { line: usize },
    #[error("Heterogen mismatch for residue {res_name} {res_num:?}: {details}")]
    HeterogenMismatch {
        res_num: Option<isize>,
        res_name: String,
        details: String,
    },
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
}

pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_into(
        ensemble: &mut Ensemble,
        reader: &mut impl BufRead,
        options: &LoadOptions,
    ) -> Result<(), Self::Error> {
        loader::read_pdb(ensemble, reader, options)
    }

    fn write_to(
        ensemble: &Ensemble,
        model_num: Option<isize>,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writer::write_pdb(ensemble, model_num, writer)
    }
}

impl Ensemble {
    /// Loads the PDB file at `path` into the ensemble.
    pub fn load_pdb<P: AsRef<Path>>(&mut self, path: P, options: &LoadOptions) -> Result<(), PdbError> {
        PdbFile::read_from_path(self, path, options)
    }

    /// Writes the model numbered `model_num`, or all models, as a PDB file.
    pub fn write_pdb(&self, writer: &mut impl Write, model_num: Option<isize>) -> Result<(), PdbError> {
        PdbFile::write_to(self, model_num, writer)
    }
}
