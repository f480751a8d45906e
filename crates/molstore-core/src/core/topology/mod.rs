//! # Topology Module
//!
//! This module infers covalent connectivity for molecules whose files do not describe it.
//!
//! ## Overview
//!
//! Bonds are derived lazily, per molecule, with one of two strategies:
//!
//! - **Backbone heuristic** - For molecules classified as proteins, a fixed intra-residue table
//!   connects the backbone atoms of every residue by name
//! - **Geometric search** - A radius and valence limited nearest-neighbour search around one atom
//!
//! ## Key Components
//!
//! - [`elements`] - Static element, amino acid and heterogen name tables, and element inference
//! - [`connectivity`] - Molecule classification, both bonding strategies and named-atom bond lookup
//!
//! ## Usage
//!
//! ```ignore
//! use molstore::core::config::ConnectivityConfig;
//! use molstore::core::topology::connectivity;
//!
//! let config = ConnectivityConfig::default();
//! connectivity::ensure_bonds(&mut molecule, 0, &config);
//! let partner = connectivity::bonded_atom(&mut molecule, 0, "C*", &config)?;
//! ```

pub mod connectivity;
pub mod elements;
