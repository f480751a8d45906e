use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::model::Model;
use crate::core::models::molecule::Molecule;
use crate::core::selection::SelectionMatcher;
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Which values an [`AtomLoop`] fills in. Unrequested values are left as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtomFields {
    pub model_num: bool,
    pub mol_name: bool,
    pub res_num: bool,
    pub res_name: bool,
    pub atom_num: bool,
    pub atom_name: bool,
    pub element: bool,
    pub position: bool,
}

impl AtomFields {
    pub const ALL: Self = Self {
        model_num: true,
        mol_name: true,
        res_num: true,
        res_name: true,
        atom_num: true,
        atom_name: true,
        element: true,
        position: true,
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtomLoopOptions {
    /// Visit only the model with this number.
    pub model_num: Option<isize>,
    /// Make one pass over the atoms, reporting each position averaged over the visited models.
    pub average: bool,
    pub fields: AtomFields,
}

/// One visited atom.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AtomInfo {
    pub model_num: Option<isize>,
    pub mol_name: Option<String>,
    pub res_num: Option<isize>,
    pub res_name: Option<String>,
    pub atom_num: Option<isize>,
    pub atom_name: Option<String>,
    pub element: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl AtomInfo {
    pub fn position(&self) -> Option<Point3<f64>> {
        Some(Point3::new(self.x?, self.y?, self.z?))
    }
}

/// Iterates over the atoms of an ensemble, model by model, then molecule by molecule.
///
/// The loop is lazy and finite. Cloning it before use gives an independent loop that starts from
/// the beginning again. After the first error no further items are produced.
#[derive(Clone)]
pub struct AtomLoop<'e> {
    ensemble: &'e Ensemble,
    selection: &'e dyn SelectionMatcher,
    options: AtomLoopOptions,
    models: Vec<usize>,
    passes: usize,
    model_pos: usize,
    mol_pos: usize,
    atom_pos: usize,
    entered: bool,
    done: bool,
}

impl<'e> AtomLoop<'e> {
    fn visited(&self) -> impl Iterator<Item = &'e Model> + '_ {
        let ensemble = self.ensemble;
        self.models.iter().map(move |&i| &ensemble.models()[i])
    }

    /// Checks a molecule before any of its atoms is reported.
    fn check_molecule(&self, mol_index: usize, mol: &Molecule) -> Result<(), StructureError> {
        mol.validate_arrays()?;
        if !self.options.average {
            return Ok(());
        }

        for model in self.visited().skip(1) {
            let other = model.molecules.get(mol_index);
            let other_len = other.map_or(0, Molecule::len);
            if other.is_none() || other_len != mol.len() {
                return Err(StructureError::InvalidArrayLengths {
                    molecule: mol.name.clone(),
                    details: format!(
                        "{} atoms in the first visited model but {} in model {:?}",
                        mol.len(),
                        other_len,
                        model.number
                    ),
                });
            }
        }
        Ok(())
    }

    fn averaged_position(
        &self,
        mol_index: usize,
        mol: &Molecule,
        index: usize,
        first: Option<isize>,
    ) -> Result<Option<Point3<f64>>, StructureError> {
        let mut sum = Vector3::zeros();
        let mut complete = true;
        for model in self.visited() {
            let other = &model.molecules[mol_index];
            if other.atom_num[index] != mol.atom_num[index] {
                return Err(StructureError::ModelAtomMismatch {
                    molecule: mol.name.clone(),
                    index,
                    first,
                    other: model.number,
                });
            }
            match other.position(index) {
                Some(p) => sum += p.coords,
                None => complete = false,
            }
        }
        Ok(complete.then(|| Point3::from(sum / self.models.len() as f64)))
    }

    fn info(
        &self,
        model: &Model,
        mol_index: usize,
        mol: &Molecule,
        index: usize,
    ) -> Result<AtomInfo, StructureError> {
        let fields = self.options.fields;
        let mut info = AtomInfo::default();

        if fields.model_num && !self.options.average {
            info.model_num = model.number;
        }
        if fields.mol_name {
            info.mol_name = Some(mol.name.clone());
        }
        if fields.res_num {
            info.res_num = mol.res_num[index];
        }
        if fields.res_name {
            info.res_name = mol.res_name[index].clone();
        }
        if fields.atom_num {
            info.atom_num = mol.atom_num[index];
        }
        if fields.atom_name {
            info.atom_name = mol.atom_name[index].clone();
        }
        if fields.element {
            info.element = mol.element[index].clone();
        }
        if fields.position {
            let position = if self.options.average {
                self.averaged_position(mol_index, mol, index, model.number)?
            } else {
                mol.position(index)
            };
            if let Some(p) = position {
                (info.x, info.y, info.z) = (Some(p.x), Some(p.y), Some(p.z));
            }
        }
        Ok(info)
    }

    fn fail(&mut self, error: StructureError) -> Option<Result<AtomInfo, StructureError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<'e> Iterator for AtomLoop<'e> {
    type Item = Result<AtomInfo, StructureError>;

    fn next(&mut self) -> Option<Self::Item> {
        let ensemble = self.ensemble;
        while !self.done {
            if self.model_pos >= self.passes {
                self.done = true;
                break;
            }
            let model = &ensemble.models()[self.models[self.model_pos]];

            let Some(mol) = model.molecules.get(self.mol_pos) else {
                self.model_pos += 1;
                self.mol_pos = 0;
                continue;
            };

            if !self.entered {
                if !self.selection.matches_molecule(&mol.name) {
                    self.mol_pos += 1;
                    continue;
                }
                if let Err(e) = self.check_molecule(self.mol_pos, mol) {
                    return self.fail(e);
                }
                self.entered = true;
            }

            if self.atom_pos >= mol.len() {
                self.mol_pos += 1;
                self.atom_pos = 0;
                self.entered = false;
                continue;
            }

            let index = self.atom_pos;
            self.atom_pos += 1;
            if !self.selection.matches_atom(
                mol.atom_num[index],
                mol.atom_name[index].as_deref(),
                mol.res_num[index],
                mol.res_name[index].as_deref(),
                &mol.name,
            ) {
                continue;
            }

            return match self.info(model, self.mol_pos, mol, index) {
                Ok(info) => Some(Ok(info)),
                Err(e) => self.fail(e),
            };
        }
        None
    }
}

impl Ensemble {
    /// Starts a loop over the atoms accepted by `selection`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NoStructureLoaded`] if the ensemble is empty. Inconsistencies
    /// found while looping are reported as items.
    pub fn atom_loop<'e>(
        &'e self,
        selection: &'e dyn SelectionMatcher,
        options: AtomLoopOptions,
    ) -> Result<AtomLoop<'e>, StructureError> {
        if self.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        let models = self.model_indices(options.model_num);
        let passes = if options.average {
            models.len().min(1)
        } else {
            models.len()
        };
        Ok(AtomLoop {
            ensemble: self,
            selection,
            options,
            models,
            passes,
            model_pos: 0,
            mol_pos: 0,
            atom_pos: 0,
            entered: false,
            done: false,
        })
    }
}
