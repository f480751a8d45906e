//! # Query Module
//!
//! Read and transform access to a loaded [`Ensemble`](crate::core::models::ensemble::Ensemble).
//!
//! - **Atom iteration** ([`atom_loop`]) visits models, molecules and atoms in order, restricted by
//!   a [`SelectionMatcher`](crate::core::selection::SelectionMatcher), and reports only the fields
//!   the caller asked for. Positions can be averaged across models.
//! - **Bond vectors** ([`bond_vectors`]) resolve an attached atom by name for a base atom and return
//!   the displacement per model, collecting [`BondWarning`]s instead of failing.
//! - **Transforms** ([`transform`]) rotate or translate stored coordinates in place.
//! - **Summaries** ([`summary`]) answer small questions about the stored structure, such as
//!   whether two atoms are bonded or what the one-letter sequence of a molecule is.
//! - **Export** ([`export`]) writes atom-loop results as CSV.

pub mod atom_loop;
pub mod bond_vectors;
pub mod export;
pub mod summary;
pub mod transform;

pub use crate::core::topology::connectivity::BondWarning;
