use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The PDB record type an atom was read from or will be written as.
///
/// Atoms without a record kind are written as standard `ATOM` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// Standard polymer atom (`ATOM`).
    Atom,
    /// Heterogen atom (`HETATM`), e.g. ligands, ions and waters.
    Hetatm,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown atom record kind: '{0}'")]
pub struct ParseRecordKindError(String);

impl FromStr for RecordKind {
    type Err = ParseRecordKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ATOM" => Ok(RecordKind::Atom),
            "HETATM" => Ok(RecordKind::Hetatm),
            other => Err(ParseRecordKindError(other.to_string())),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RecordKind::Atom => "ATOM",
            RecordKind::Hetatm => "HETATM",
        })
    }
}

/// A single atom's worth of per-atom fields, used to append atoms to a molecule.
///
/// Every field is optional: a file may leave any of them blank, and the structure store keeps the
/// absence rather than inventing a value. Inside a [`Molecule`](super::molecule::Molecule) these
/// fields live in parallel arrays; this struct is the row view used on the way in and out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomRecord {
    /// The atom serial number (PDB columns 7-11).
    pub atom_num: Option<isize>,
    /// The atom name (e.g. "CA", "N", "O1'").
    pub atom_name: Option<String>,
    /// The element symbol (e.g. "C", "FE").
    pub element: Option<String>,
    /// Whether the atom is a standard or a heterogen atom.
    pub record: Option<RecordKind>,
    pub chain_id: Option<String>,
    pub segment_id: Option<String>,
    /// The residue name (e.g. "ALA", "HOH").
    pub res_name: Option<String>,
    /// The residue sequence number.
    pub res_num: Option<isize>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl AtomRecord {
    /// Creates a named atom at the given position, all other fields absent.
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        Self {
            atom_name: Some(name.to_string()),
            x: Some(position.x),
            y: Some(position.y),
            z: Some(position.z),
            ..Default::default()
        }
    }

    pub fn with_number(mut self, atom_num: isize) -> Self {
        self.atom_num = Some(atom_num);
        self
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }

    pub fn with_record(mut self, record: RecordKind) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_residue(mut self, res_num: isize, res_name: &str) -> Self {
        self.res_num = Some(res_num);
        self.res_name = Some(res_name.to_string());
        self
    }

    pub fn with_chain(mut self, chain_id: &str) -> Self {
        self.chain_id = Some(chain_id.to_string());
        self
    }

    pub fn with_segment(mut self, segment_id: &str) -> Self {
        self.segment_id = Some(segment_id.to_string());
        self
    }

    /// Returns the position if all three coordinates are present.
    pub fn position(&self) -> Option<Point3<f64>> {
        Some(Point3::new(self.x?, self.y?, self.z?))
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.x = Some(position.x);
        self.y = Some(position.y);
        self.z = Some(position.z);
    }
}
