use super::atom::{AtomRecord, RecordKind};
use super::error::StructureError;
use nalgebra::Point3;
use std::path::PathBuf;

/// The polymer classification of a molecule, memoized by the connectivity engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeKind {
    /// At least one residue is a standard amino acid.
    Protein,
    /// No residue is a standard amino acid (ligands, nucleic acids, solvent).
    Other,
}

/// Where a molecule was loaded from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Source {
    /// The file name without directories.
    pub file_name: Option<String>,
    /// The path as given by the caller.
    pub file_path: Option<PathBuf>,
    /// The absolute form of `file_path`, when it could be resolved.
    pub file_path_abs: Option<PathBuf>,
    /// The model number in the file, if the file had MODEL records.
    pub file_model: Option<isize>,
    /// The 1-based molecule number within its model in the file.
    pub file_mol_num: Option<usize>,
}

/// A named molecule stored as parallel per-atom arrays.
///
/// All per-atom arrays share one length, the atom count, and atom `i` is the entry at index `i` in
/// every array. The arrays are public so callers can read and edit them in bulk; the serializer
/// and the query layer check [`Molecule::validate_arrays`] before relying on them.
///
/// The bond table is private. It holds, for every atom, the indices of its bonded partners within
/// this molecule, and [`Molecule::connect`] keeps it symmetric: `j` is in `bonded(i)` exactly when
/// `i` is in `bonded(j)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub source: Option<Source>,

    pub atom_num: Vec<Option<isize>>,
    pub atom_name: Vec<Option<String>>,
    pub element: Vec<Option<String>>,
    pub record: Vec<Option<RecordKind>>,
    pub chain_id: Vec<Option<String>>,
    pub segment_id: Vec<Option<String>>,
    pub res_name: Vec<Option<String>>,
    pub res_num: Vec<Option<isize>>,
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
    pub z: Vec<Option<f64>>,

    bonded: Vec<Vec<usize>>,
    kind: Option<MoleculeKind>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Returns the number of atoms in the molecule.
    pub fn len(&self) -> usize {
        self.atom_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an atom with no bonds and returns its index.
    pub fn add_atom(&mut self, atom: AtomRecord) -> usize {
        let AtomRecord {
            atom_num,
            atom_name,
            element,
            record,
            chain_id,
            segment_id,
            res_name,
            res_num,
            x,
            y,
            z,
        } = atom;

        self.atom_num.push(atom_num);
        self.atom_name.push(atom_name);
        self.element.push(element);
        self.record.push(record);
        self.chain_id.push(chain_id);
        self.segment_id.push(segment_id);
        self.res_name.push(res_name);
        self.res_num.push(res_num);
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
        self.bonded.push(Vec::new());

        self.len() - 1
    }

    /// Returns a copy of atom `index` as a row record.
    pub fn atom(&self, index: usize) -> Option<AtomRecord> {
        if index >= self.len() {
            return None;
        }
        Some(AtomRecord {
            atom_num: self.atom_num.get(index).copied().flatten(),
            atom_name: self.atom_name.get(index).cloned().flatten(),
            element: self.element.get(index).cloned().flatten(),
            record: self.record.get(index).copied().flatten(),
            chain_id: self.chain_id.get(index).cloned().flatten(),
            segment_id: self.segment_id.get(index).cloned().flatten(),
            res_name: self.res_name.get(index).cloned().flatten(),
            res_num: self.res_num.get(index).copied().flatten(),
            x: self.x.get(index).copied().flatten(),
            y: self.y.get(index).copied().flatten(),
            z: self.z.get(index).copied().flatten(),
        })
    }

    /// Records a bond between atoms `i` and `j`.
    ///
    /// Connecting an already bonded pair, or an atom to itself, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::AtomIndexOutOfRange`] if either index is not a valid atom.
    pub fn connect(&mut self, i: usize, j: usize) -> Result<(), StructureError> {
        let len = self.bonded.len();
        for index in [i, j] {
            if index >= len {
                return Err(StructureError::AtomIndexOutOfRange { index, len });
            }
        }
        if i == j || self.bonded[i].contains(&j) {
            return Ok(());
        }
        self.bonded[i].push(j);
        self.bonded[j].push(i);
        Ok(())
    }

    /// The bonded partners of atom `index`, in the order the bonds were recorded.
    pub fn bonded(&self, index: usize) -> &[usize] {
        self.bonded.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of bonds in the molecule, each counted once.
    pub fn bond_count(&self) -> usize {
        self.bonded.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Removes every bond and forgets the memoized polymer classification.
    pub fn clear_connectivity(&mut self) {
        self.bonded.iter_mut().for_each(Vec::clear);
        self.kind = None;
    }

    pub fn kind(&self) -> Option<MoleculeKind> {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: MoleculeKind) {
        self.kind = Some(kind);
    }

    pub fn position(&self, index: usize) -> Option<Point3<f64>> {
        Some(Point3::new(
            (*self.x.get(index)?)?,
            (*self.y.get(index)?)?,
            (*self.z.get(index)?)?,
        ))
    }

    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Result<(), StructureError> {
        let len = self.len();
        if index >= len || index >= self.x.len() || index >= self.y.len() || index >= self.z.len() {
            return Err(StructureError::AtomIndexOutOfRange { index, len });
        }
        self.x[index] = Some(position.x);
        self.y[index] = Some(position.y);
        self.z[index] = Some(position.z);
        Ok(())
    }

    /// Finds the index of the first atom carrying serial number `atom_num`.
    pub fn atom_index(&self, atom_num: isize) -> Option<usize> {
        self.atom_num.iter().position(|n| *n == Some(atom_num))
    }

    /// Checks that every per-atom array has the same length as the atom name array.
    pub fn validate_arrays(&self) -> Result<(), StructureError> {
        let expected = self.atom_name.len();
        let lengths = [
            ("atom_num", self.atom_num.len()),
            ("element", self.element.len()),
            ("record", self.record.len()),
            ("chain_id", self.chain_id.len()),
            ("segment_id", self.segment_id.len()),
            ("res_name", self.res_name.len()),
            ("res_num", self.res_num.len()),
            ("x", self.x.len()),
            ("y", self.y.len()),
            ("z", self.z.len()),
            ("bonded", self.bonded.len()),
        ];

        let mismatched: Vec<String> = lengths
            .iter()
            .filter(|(_, len)| *len != expected)
            .map(|(name, len)| format!("{name} has {len} entries"))
            .collect();

        if mismatched.is_empty() {
            Ok(())
        } else {
            Err(StructureError::InvalidArrayLengths {
                molecule: self.name.clone(),
                details: format!("expected {expected} atoms, {}", mismatched.join(", ")),
            })
        }
    }

    /// Whether atom `index` has the same identity fields in `self` and `other`.
    ///
    /// Coordinates are not compared.
    pub fn same_atom_identity(&self, other: &Molecule, index: usize) -> bool {
        match (self.atom(index), other.atom(index)) {
            (Some(a), Some(b)) => {
                a.atom_num == b.atom_num
                    && a.atom_name == b.atom_name
                    && a.element == b.element
                    && a.record == b.record
                    && a.chain_id == b.chain_id
                    && a.segment_id == b.segment_id
                    && a.res_name == b.res_name
                    && a.res_num == b.res_num
            }
            _ => false,
        }
    }
}
