use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::molecule::Molecule;
use crate::core::selection::SelectionMatcher;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::debug;

impl Ensemble {
    /// Rotates atom positions about `origin` in place.
    ///
    /// Every model is affected unless `model` names one, and every atom unless `selection`
    /// restricts them. Atoms without a complete position are left alone.
    pub fn rotate(
        &mut self,
        rotation: &Matrix3<f64>,
        origin: Point3<f64>,
        model: Option<isize>,
        selection: Option<&dyn SelectionMatcher>,
    ) -> Result<(), StructureError> {
        let moved = self.transform(model, selection, |p| origin + rotation * (p - origin))?;
        debug!(atoms = moved, "Rotated atoms.");
        Ok(())
    }

    /// Translates atom positions by `shift` in place, with the same targeting as [`Ensemble::rotate`].
    pub fn translate(
        &mut self,
        shift: &Vector3<f64>,
        model: Option<isize>,
        selection: Option<&dyn SelectionMatcher>,
    ) -> Result<(), StructureError> {
        let moved = self.transform(model, selection, |p| p + *shift)?;
        debug!(atoms = moved, "Translated atoms.");
        Ok(())
    }

    fn transform(
        &mut self,
        model: Option<isize>,
        selection: Option<&dyn SelectionMatcher>,
        apply: impl Fn(Point3<f64>) -> Point3<f64>,
    ) -> Result<usize, StructureError> {
        if self.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        let targets = self.model_indices(model);
        if targets.is_empty() {
            return Err(StructureError::ModelNotFound(model));
        }

        let mut moved = 0;
        for index in targets {
            for mol in &mut self.models_mut()[index].molecules {
                mol.validate_arrays()?;
                if selection.is_some_and(|s| !s.matches_molecule(&mol.name)) {
                    continue;
                }
                for i in 0..mol.len() {
                    if !selected(mol, i, selection) {
                        continue;
                    }
                    if let Some(p) = mol.position(i) {
                        mol.set_position(i, apply(p))?;
                        moved += 1;
                    }
                }
            }
        }
        Ok(moved)
    }
}

fn selected(mol: &Molecule, index: usize, selection: Option<&dyn SelectionMatcher>) -> bool {
    selection.is_none_or(|s| {
        s.matches_atom(
            mol.atom_num[index],
            mol.atom_name[index].as_deref(),
            mol.res_num[index],
            mol.res_name[index].as_deref(),
            &mol.name,
        )
    })
}
