//! # molstore Core Library
//!
//! An in-memory store for 3D molecular structures, with the codecs that fill it from PDB and XYZ
//! coordinate files, the heuristics that infer covalent connectivity where a file does not give it,
//! and the serializer that regenerates a complete multi-record PDB file from the stored ensemble.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers:
//!
//! - **[`core`]: The Foundation.** The structure store itself (`Ensemble` → `Model` → `Molecule`),
//!   the selection collaborator, the connectivity inference engine, configuration, and the file
//!   format readers and writers.
//!
//! - **[`query`]: The Public Query API.** Iteration over atoms (optionally averaged across models),
//!   bond vector extraction, and rigid-body transforms applied in place to the stored coordinates.
//!
//! ```ignore
//! use molstore::core::io::LoadOptions;
//! use molstore::core::models::ensemble::Ensemble;
//!
//! let mut ensemble = Ensemble::new();
//! ensemble.load_pdb("1ubq.pdb", &LoadOptions::default())?;
//! ensemble.write_pdb(&mut std::io::stdout(), None)?;
//! ```

pub mod core;
pub mod query;
