//! # Core Module
//!
//! The fundamental building blocks of molstore: the structure store data model, the file format
//! codecs, the connectivity inference engine and the selection collaborator.
//!
//! ## Architecture
//!
//! - **Structure Store** ([`models`]) - Ensembles of models, molecules and per-atom parallel arrays
//! - **File I/O** ([`io`]) - PDB and XYZ decoders, segmenters, loaders and serializers
//! - **Connectivity** ([`topology`]) - Element tables, residue classification and bond inference
//! - **Selections** ([`selection`]) - The atom/molecule matcher used by queries and transforms
//! - **Configuration** ([`config`]) - Tunable radii for the geometric bond search

pub mod config;
pub mod io;
pub mod models;
pub mod selection;
pub mod topology;
