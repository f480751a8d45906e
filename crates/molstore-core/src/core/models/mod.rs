//! # Core Models Module
//!
//! The in-memory structure store.
//!
//! ## Overview
//!
//! A loaded structure is an [`ensemble::Ensemble`] of [`model::Model`]s. Every model holds the same
//! ordered list of [`molecule::Molecule`]s, and each molecule stores its atoms as a set of parallel
//! per-atom arrays addressed by a plain `usize` index. Bonds are adjacency lists of indices into the
//! same molecule and are kept symmetric by construction.
//!
//! ## Key Components
//!
//! - [`atom`] - The per-atom record used to add atoms, and the ATOM/HETATM record kind
//! - [`molecule`] - Struct-of-arrays atom storage with the bond adjacency table
//! - [`model`] - One full set of coordinates for every molecule
//! - [`ensemble`] - The top-level store and its construction/mutation primitives
//! - [`error`] - Fatal structure store errors
//!
//! ## Usage
//!
//! ```ignore
//! use molstore::core::models::{atom::AtomRecord, ensemble::Ensemble};
//! use nalgebra::Point3;
//!
//! let mut ensemble = Ensemble::new();
//! ensemble.add_molecule(None, "ligand")?;
//! let c1 = ensemble.add_atom("ligand", AtomRecord::new("C1", Point3::new(0.0, 0.0, 0.0)))?;
//! let c2 = ensemble.add_atom("ligand", AtomRecord::new("C2", Point3::new(1.5, 0.0, 0.0)))?;
//! ensemble.connect_atom("ligand", c1, c2)?;
//! ```

pub mod atom;
pub mod ensemble;
pub mod error;
pub mod model;
pub mod molecule;
