//! Provides input/output functionality for molecular coordinate file formats.
//!
//! Loaders decode a file into models and molecules, then hand them to the
//! [`Ensemble`](crate::core::models::ensemble::Ensemble), which names and stores them according to
//! [`LoadOptions`]. Writers regenerate complete files from the stored ensemble.

pub mod pdb;
pub mod traits;
pub mod xyz;

use crate::core::models::molecule::Molecule;
use std::path::PathBuf;

/// Controls which parts of a file are loaded and how they are named.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Only load models with these numbers (1-based for files without MODEL records).
    pub read_model: Option<Vec<isize>>,
    /// Only load molecules with these 1-based numbers within each model.
    pub read_mol: Option<Vec<usize>>,
    /// Renumber the loaded models, one number per loaded model.
    pub set_model_num: Option<Vec<isize>>,
    /// Name the loaded molecules, one name per molecule of a model.
    pub set_mol_name: Option<Vec<String>>,
    /// The PDB alternate location indicator to keep.
    pub alt_loc: Option<char>,
    /// The file the data comes from, used for provenance and default molecule names.
    pub source_path: Option<PathBuf>,
}

impl LoadOptions {
    pub(crate) fn keeps_model(&self, number: Option<isize>) -> bool {
        match (&self.read_model, number) {
            (None, _) => true,
            (Some(wanted), Some(n)) => wanted.contains(&n),
            (Some(wanted), None) => wanted.contains(&1),
        }
    }

    pub(crate) fn keeps_molecule(&self, number: usize) -> bool {
        self.read_mol
            .as_ref()
            .is_none_or(|wanted| wanted.contains(&number))
    }
}

/// A molecule decoded from a file, before it is named and stored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedMolecule {
    pub file_mol_num: usize,
    pub molecule: Molecule,
}

/// A model decoded from a file, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedModel {
    pub number: Option<isize>,
    pub molecules: Vec<LoadedMolecule>,
}
