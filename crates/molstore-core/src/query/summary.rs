use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::molecule::Molecule;
use crate::core::selection::SelectionMatcher;
use crate::core::topology::{connectivity, elements};

const UNKNOWN_RESIDUE_CODE: char = 'X';

fn first_match(mol: &Molecule, selection: &dyn SelectionMatcher) -> Option<usize> {
    (0..mol.len()).find(|&i| {
        selection.matches_atom(
            mol.atom_num[i],
            mol.atom_name[i].as_deref(),
            mol.res_num[i],
            mol.res_name[i].as_deref(),
            &mol.name,
        )
    })
}

impl Ensemble {
    /// Whether the first atoms matched by two selections are directly bonded.
    ///
    /// Only the first model is searched, and both atoms must lie in the same molecule. Bonds are
    /// inferred for the two atoms if they have none yet.
    pub fn are_bonded(
        &mut self,
        first: &dyn SelectionMatcher,
        second: &dyn SelectionMatcher,
    ) -> Result<bool, StructureError> {
        if self.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        let config = *self.config();

        for mol in &mut self.models_mut()[0].molecules {
            mol.validate_arrays()?;
            if !first.matches_molecule(&mol.name) || !second.matches_molecule(&mol.name) {
                continue;
            }
            let (Some(i), Some(j)) = (first_match(mol, first), first_match(mol, second)) else {
                continue;
            };
            connectivity::ensure_bonds(mol, i, &config);
            connectivity::ensure_bonds(mol, j, &config);
            return Ok(mol.bonded(i).contains(&j));
        }
        Ok(false)
    }

    /// The one-letter amino acid sequence of the first model, or of one molecule in it.
    ///
    /// Residues are runs of atoms sharing a residue number and name. Non-standard residues are
    /// written as `X`.
    pub fn one_letter_codes(&self, mol_name: Option<&str>) -> Result<String, StructureError> {
        let model = self.models().first().ok_or(StructureError::NoStructureLoaded)?;
        if let Some(name) = mol_name {
            if model.molecule(name).is_none() {
                return Err(StructureError::MoleculeNotFound(name.to_string()));
            }
        }

        let mut codes = String::new();
        for mol in &model.molecules {
            mol.validate_arrays()?;
            if mol_name.is_some_and(|name| name != mol.name) {
                continue;
            }
            let mut previous = None;
            for i in 0..mol.len() {
                let residue = (mol.res_num[i], mol.res_name[i].as_deref());
                if previous == Some(residue) {
                    continue;
                }
                previous = Some(residue);
                if let Some(res_name) = residue.1 {
                    codes.push(elements::one_letter_code(res_name).unwrap_or(UNKNOWN_RESIDUE_CODE));
                }
            }
        }
        Ok(codes)
    }
}
