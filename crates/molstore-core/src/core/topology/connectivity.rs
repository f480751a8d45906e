use super::elements;
use crate::core::config::ConnectivityConfig;
use crate::core::models::molecule::{Molecule, MoleculeKind};
use crate::core::selection::wildcard_match;
use thiserror::Error;
use tracing::{debug, trace};

const HYDROGEN: &str = "H";

/// Backbone atom pairs connected within every residue of a protein. `H` is an alias of `HN`.
const BACKBONE_PAIRS: [(&str, &str); 6] = [
    ("N", "HN"),
    ("N", "H"),
    ("N", "CA"),
    ("CA", "HA"),
    ("CA", "C"),
    ("C", "O"),
];

/// A bond lookup that could not produce a single partner atom.
///
/// These are warnings, not errors: a caller scanning several models or molecules records them and
/// carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BondWarning {
    #[error("More than one attached atom found: {names:?}")]
    Ambiguous { names: Vec<String> },
    #[error("No attached atom matching '{pattern}' could be found")]
    NotFound { pattern: String },
    #[error("The base atom could not be found in molecule '{molecule}'")]
    BaseAtomNotFound { molecule: String },
    #[error("Atom {index} of molecule '{molecule}' has no position")]
    MissingPosition { molecule: String, index: usize },
}

/// Classifies a molecule as a protein if any of its residues is a standard amino acid.
pub fn classify(mol: &Molecule) -> MoleculeKind {
    let is_protein = mol
        .res_name
        .iter()
        .flatten()
        .any(|name| elements::is_amino_acid(name));
    if is_protein {
        MoleculeKind::Protein
    } else {
        MoleculeKind::Other
    }
}

/// Connects backbone atoms by name within each contiguous run of atoms sharing a residue number.
pub fn protein_connect(mol: &mut Molecule) {
    let mut start = 0;
    while start < mol.len() {
        let res_num = mol.res_num.get(start).copied().flatten();
        let end = (start + 1..mol.len())
            .find(|&i| mol.res_num.get(i).copied().flatten() != res_num)
            .unwrap_or(mol.len());
        protein_intra_connect(mol, start..end);
        start = end;
    }
}

fn protein_intra_connect(mol: &mut Molecule, run: std::ops::Range<usize>) {
    let find = |name: &str| {
        run.clone()
            .find(|&i| mol.atom_name.get(i).is_some_and(|n| n.as_deref() == Some(name)))
    };

    let pairs: Vec<(usize, usize)> = BACKBONE_PAIRS
        .iter()
        .filter_map(|&(a, b)| Some((find(a)?, find(b)?)))
        .collect();

    for (i, j) in pairs {
        // Indices come from the run, which lies inside the molecule.
        let _ = mol.connect(i, j);
    }
}

/// Connects atom `index` to its nearest neighbours within `radius`.
///
/// Hydrogen-hydrogen pairs and atoms without a position are never candidates. The central atom
/// takes at most as many partners as its element allows (H 1, O 2, N 3, C 4, otherwise unlimited),
/// counting bonds it already has, and a candidate that is already saturated is passed over.
/// Returns the number of bonds created.
pub fn find_bonded_atoms(mol: &mut Molecule, index: usize, radius: f64) -> usize {
    let Some(centre) = mol.position(index) else {
        return 0;
    };
    fn element_of(mol: &Molecule, i: usize) -> Option<&str> {
        mol.element.get(i).and_then(|e| e.as_deref())
    }
    let is_hydrogen = element_of(mol, index) == Some(HYDROGEN);

    let mut candidates: Vec<(f64, usize)> = (0..mol.len())
        .filter(|&k| k != index)
        .filter(|&k| !(is_hydrogen && element_of(mol, k) == Some(HYDROGEN)))
        .filter(|&k| !mol.bonded(index).contains(&k))
        .filter(|&k| mol.bonded(k).len() < elements::max_connections(element_of(mol, k)))
        .filter_map(|k| {
            let distance = nalgebra::distance(&centre, &mol.position(k)?);
            (distance < radius).then_some((distance, k))
        })
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let capacity = elements::max_connections(element_of(mol, index))
        .saturating_sub(mol.bonded(index).len());

    let mut created = 0;
    for (distance, k) in candidates.into_iter().take(capacity) {
        if mol.connect(index, k).is_ok() {
            trace!(molecule = %mol.name, index, partner = k, distance, "Geometric bond.");
            created += 1;
        }
    }
    created
}

/// Makes sure atom `index` has bonds, inferring them if it has none.
///
/// The first time a molecule needs bonds it is classified, and proteins get the backbone heuristic
/// for every residue. If the atom is still unbonded afterwards, the geometric search runs around it
/// with the fallback radius.
pub fn ensure_bonds(mol: &mut Molecule, index: usize, config: &ConnectivityConfig) {
    ensure_bonds_within(mol, index, config.fallback_radius);
}

fn ensure_bonds_within(mol: &mut Molecule, index: usize, radius: f64) {
    if index >= mol.len() || !mol.bonded(index).is_empty() {
        return;
    }

    if mol.kind().is_none() {
        let kind = classify(mol);
        mol.set_kind(kind);
        debug!(molecule = %mol.name, ?kind, "Classified molecule.");
        if kind == MoleculeKind::Protein {
            protein_connect(mol);
        }
    }

    if mol.bonded(index).is_empty() {
        find_bonded_atoms(mol, index, radius);
    }
}

/// Infers bonds for every atom of the molecule that has none.
///
/// Works like [`ensure_bonds`], except that the geometric step uses the generic search radius
/// rather than the wider fallback used by bond lookups.
pub fn infer_all(mol: &mut Molecule, config: &ConnectivityConfig) {
    for index in 0..mol.len() {
        ensure_bonds_within(mol, index, config.search_radius);
    }
    debug!(
        molecule = %mol.name,
        bonds = mol.bond_count(),
        radius = config.search_radius,
        "Inferred connectivity."
    );
}

/// Finds the single atom bonded to `index` whose name matches `pattern`.
pub fn bonded_atom(
    mol: &mut Molecule,
    index: usize,
    pattern: &str,
    config: &ConnectivityConfig,
) -> Result<usize, BondWarning> {
    if index >= mol.len() {
        return Err(BondWarning::BaseAtomNotFound {
            molecule: mol.name.clone(),
        });
    }
    ensure_bonds(mol, index, config);

    let matching: Vec<usize> = mol
        .bonded(index)
        .iter()
        .copied()
        .filter(|&k| {
            mol.atom_name
                .get(k)
                .and_then(|n| n.as_deref())
                .is_some_and(|name| wildcard_match(pattern, name))
        })
        .collect();

    match matching.as_slice() {
        [single] => Ok(*single),
        [] => Err(BondWarning::NotFound {
            pattern: pattern.to_string(),
        }),
        several => Err(BondWarning::Ambiguous {
            names: several
                .iter()
                .map(|&k| mol.atom_name[k].clone().unwrap_or_default())
                .collect(),
        }),
    }
}
