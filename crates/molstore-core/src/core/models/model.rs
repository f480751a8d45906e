use super::molecule::Molecule;

/// One complete set of coordinates for every molecule in the ensemble.
///
/// A model read from a PDB file without `MODEL` records has no number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub number: Option<isize>,
    pub molecules: Vec<Molecule>,
}

impl Model {
    pub fn new(number: Option<isize>) -> Self {
        Self {
            number,
            molecules: Vec::new(),
        }
    }

    pub fn molecule(&self, name: &str) -> Option<&Molecule> {
        self.molecules.iter().find(|mol| mol.name == name)
    }

    pub fn molecule_mut(&mut self, name: &str) -> Option<&mut Molecule> {
        self.molecules.iter_mut().find(|mol| mol.name == name)
    }

    pub fn molecule_index(&self, name: &str) -> Option<usize> {
        self.molecules.iter().position(|mol| mol.name == name)
    }

    /// Total atom count across all molecules of this model.
    pub fn atom_count(&self) -> usize {
        self.molecules.iter().map(Molecule::len).sum()
    }
}
