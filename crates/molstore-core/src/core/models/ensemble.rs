use super::atom::AtomRecord;
use super::error::StructureError;
use super::model::Model;
use super::molecule::{Molecule, Source};
use crate::core::config::ConnectivityConfig;
use crate::core::io::{LoadOptions, LoadedModel};
use crate::core::topology::connectivity;
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use tracing::{debug, info};

const DEFAULT_FILE_STEM: &str = "structure";

/// The top-level structure store: an ordered list of models.
///
/// Every model is expected to hold the same molecules, in the same order, with the same atom
/// identities; only coordinates differ between models. Construction primitives keep that shape by
/// applying molecule, atom and bond additions to every model at once. Loaders may still produce
/// ensembles that violate it (for instance by loading a single-model file next to an NMR
/// ensemble), which is why [`Ensemble::validate`] is checked before serialization.
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    models: Vec<Model>,
    config: ConnectivityConfig,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ensemble that infers connectivity with the given radii.
    pub fn with_config(config: ConnectivityConfig) -> Self {
        Self {
            models: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConnectivityConfig) {
        self.config = config;
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn num_models(&self) -> usize {
        self.models.len()
    }

    /// Number of molecules in the first model.
    pub fn num_molecules(&self) -> usize {
        self.models.first().map_or(0, |m| m.molecules.len())
    }

    pub fn model_numbers(&self) -> Vec<Option<isize>> {
        self.models.iter().map(|m| m.number).collect()
    }

    /// Returns the first model carrying `number`.
    pub fn model(&self, number: Option<isize>) -> Option<&Model> {
        self.models.iter().find(|m| m.number == number)
    }

    /// Indices of the models visited for a model filter, in visiting order.
    ///
    /// With a number, only models carrying that number are visited. Without one, numbered models
    /// are visited in ascending number order followed by any unnumbered models in storage order.
    pub fn model_indices(&self, filter: Option<isize>) -> Vec<usize> {
        if let Some(number) = filter {
            return (0..self.models.len())
                .filter(|&i| self.models[i].number == Some(number))
                .collect();
        }

        let mut numbered: Vec<usize> = (0..self.models.len())
            .filter(|&i| self.models[i].number.is_some())
            .collect();
        numbered.sort_by_key(|&i| self.models[i].number);
        numbered.extend((0..self.models.len()).filter(|&i| self.models[i].number.is_none()));
        numbered
    }

    /// Iterates over the models selected by `filter`, in the order of [`Ensemble::model_indices`].
    pub fn model_loop(&self, filter: Option<isize>) -> impl Iterator<Item = &Model> + '_ {
        self.model_indices(filter)
            .into_iter()
            .map(move |i| &self.models[i])
    }

    /// Adds a model, copying its molecules from an existing model.
    ///
    /// The copy source is the model numbered `coords_from`, or the first model when no source is
    /// given. Adding a model to an empty ensemble creates an empty model. Returns the new model's
    /// storage index.
    pub fn add_model(
        &mut self,
        number: Option<isize>,
        coords_from: Option<isize>,
    ) -> Result<usize, StructureError> {
        if let Some(n) = number {
            if self.model(Some(n)).is_some() {
                return Err(StructureError::ModelExists(n));
            }
        }

        let molecules = match coords_from {
            Some(source) => self
                .model(Some(source))
                .ok_or(StructureError::ModelNotFound(Some(source)))?
                .molecules
                .clone(),
            None => self
                .models
                .first()
                .map(|m| m.molecules.clone())
                .unwrap_or_default(),
        };

        self.models.push(Model { number, molecules });
        debug!(model = ?number, total = self.models.len(), "Added model.");
        Ok(self.models.len() - 1)
    }

    /// Adds an empty molecule to every model selected by `model`.
    ///
    /// An empty ensemble first gets a model carrying `model` as its number.
    pub fn add_molecule(&mut self, model: Option<isize>, name: &str) -> Result<(), StructureError> {
        if self.models.is_empty() {
            self.models.push(Model::new(model));
        }

        let targets = self.model_indices(model);
        if targets.is_empty() {
            return Err(StructureError::ModelNotFound(model));
        }
        if let Some(&i) = targets
            .iter()
            .find(|&&i| self.models[i].molecule(name).is_some())
        {
            return Err(StructureError::MoleculeExists {
                name: name.to_string(),
                model: self.models[i].number,
            });
        }

        for i in targets {
            self.models[i].molecules.push(Molecule::new(name));
        }
        Ok(())
    }

    /// Appends an atom to molecule `mol_name` in every model and returns its index.
    ///
    /// The molecule is created in every model if it does not exist yet.
    pub fn add_atom(&mut self, mol_name: &str, atom: AtomRecord) -> Result<usize, StructureError> {
        self.ensure_molecule(mol_name)?;

        let mut index = 0;
        for model in &mut self.models {
            if let Some(mol) = model.molecule_mut(mol_name) {
                index = mol.add_atom(atom.clone());
            }
        }
        Ok(index)
    }

    /// Appends an atom to molecule `mol_name` with a separate position for every model.
    ///
    /// `positions` is consumed in storage order of the models.
    pub fn add_atom_per_model(
        &mut self,
        mol_name: &str,
        atom: AtomRecord,
        positions: &[Point3<f64>],
    ) -> Result<usize, StructureError> {
        let expected = self.models.len().max(1);
        if positions.len() != expected {
            return Err(StructureError::PositionCount {
                expected,
                found: positions.len(),
            });
        }
        self.ensure_molecule(mol_name)?;

        let mut index = 0;
        for (model, position) in self.models.iter_mut().zip(positions) {
            if let Some(mol) = model.molecule_mut(mol_name) {
                let mut atom = atom.clone();
                atom.set_position(*position);
                index = mol.add_atom(atom);
            }
        }
        Ok(index)
    }

    /// Records a bond between atoms `i` and `j` of molecule `mol_name` in every model.
    pub fn connect_atom(&mut self, mol_name: &str, i: usize, j: usize) -> Result<(), StructureError> {
        if self.models.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        for model in &mut self.models {
            model
                .molecule_mut(mol_name)
                .ok_or_else(|| StructureError::MoleculeNotFound(mol_name.to_string()))?
                .connect(i, j)?;
        }
        Ok(())
    }

    /// Looks up a molecule by name.
    ///
    /// Without a model number the ensemble must hold at most one model.
    pub fn get_molecule(
        &self,
        name: &str,
        model: Option<isize>,
    ) -> Result<Option<&Molecule>, StructureError> {
        Ok(self
            .resolve_model_index(model)?
            .and_then(|i| self.models[i].molecule(name)))
    }

    pub fn get_molecule_mut(
        &mut self,
        name: &str,
        model: Option<isize>,
    ) -> Result<Option<&mut Molecule>, StructureError> {
        Ok(match self.resolve_model_index(model)? {
            Some(i) => self.models[i].molecule_mut(name),
            None => None,
        })
    }

    /// Deletes the model numbered `model`, or every model when no number is given.
    pub fn delete(&mut self, model: Option<isize>) -> Result<(), StructureError> {
        match model {
            None => {
                self.models.clear();
                info!("Deleted all structural data.");
            }
            Some(n) => {
                let before = self.models.len();
                self.models.retain(|m| m.number != Some(n));
                if self.models.len() == before {
                    return Err(StructureError::ModelNotFound(Some(n)));
                }
                debug!(model = n, "Deleted model.");
            }
        }
        Ok(())
    }

    /// Checks that every model holds the same molecules, by name and order.
    pub fn validate(&self) -> Result<(), StructureError> {
        let Some(first) = self.models.first() else {
            return Ok(());
        };

        for model in &self.models[1..] {
            if model.molecules.len() != first.molecules.len() {
                return Err(StructureError::InconsistentModels(format!(
                    "model {:?} has {} molecules, model {:?} has {}",
                    first.number,
                    first.molecules.len(),
                    model.number,
                    model.molecules.len()
                )));
            }
            for (a, b) in first.molecules.iter().zip(&model.molecules) {
                if a.name != b.name {
                    return Err(StructureError::InconsistentModels(format!(
                        "molecule '{}' in model {:?} corresponds to '{}' in model {:?}",
                        a.name, first.number, b.name, model.number
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks [`Ensemble::validate`] plus per-atom identity across all models.
    pub fn validate_models(&self) -> Result<(), StructureError> {
        self.validate()?;
        let Some(first) = self.models.first() else {
            return Ok(());
        };

        for model in &self.models[1..] {
            for (a, b) in first.molecules.iter().zip(&model.molecules) {
                a.validate_arrays()?;
                b.validate_arrays()?;
                if a.len() != b.len() {
                    return Err(StructureError::InconsistentModels(format!(
                        "molecule '{}' has {} atoms in model {:?} and {} in model {:?}",
                        a.name,
                        a.len(),
                        first.number,
                        b.len(),
                        model.number
                    )));
                }
                if let Some(index) = (0..a.len()).find(|&i| !a.same_atom_identity(b, i)) {
                    return Err(StructureError::ModelAtomMismatch {
                        molecule: a.name.clone(),
                        index,
                        first: first.number,
                        other: model.number,
                    });
                }
            }
        }
        Ok(())
    }

    /// Infers bonds for every atom of every molecule that has none yet.
    pub fn infer_connectivity(&mut self) {
        let config = self.config;
        for model in &mut self.models {
            for mol in &mut model.molecules {
                connectivity::infer_all(mol, &config);
            }
        }
    }

    /// Whether the first model holds a molecule called `name`.
    pub fn has_molecule(&self, name: &str) -> bool {
        self.models
            .first()
            .is_some_and(|m| m.molecule(name).is_some())
    }

    /// Renumbers the model numbered `from` (or the only model) to `to`.
    pub fn set_model(&mut self, from: Option<isize>, to: isize) -> Result<(), StructureError> {
        if from != Some(to) && self.model(Some(to)).is_some() {
            return Err(StructureError::ModelExists(to));
        }
        let index = match from {
            Some(_) => self.models.iter().position(|m| m.number == from),
            None => self.resolve_model_index(None)?,
        }
        .ok_or(StructureError::ModelNotFound(from))?;

        self.models[index].number = Some(to);
        Ok(())
    }

    /// Keeps only the model numbered `keep` and renumbers it to `to`.
    pub fn collapse_ensemble(&mut self, keep: isize, to: isize) -> Result<(), StructureError> {
        if self.model(Some(keep)).is_none() {
            return Err(StructureError::ModelNotFound(Some(keep)));
        }
        self.models.retain(|m| m.number == Some(keep));
        self.models.truncate(1);
        self.set_model(Some(keep), to)?;
        info!(model = to, "Collapsed the ensemble to a single model.");
        Ok(())
    }

    /// Replaces all models with a single unnumbered model holding the mean atom positions.
    ///
    /// The models must agree atom for atom (see [`Ensemble::validate_models`]). Atoms without a
    /// complete position in some model keep the first model's position.
    pub fn mean(&mut self) -> Result<(), StructureError> {
        if self.models.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        self.validate_models()?;

        let count = self.models.len() as f64;
        let mut mean = self.models[0].clone();
        mean.number = None;
        for (mol_index, mol) in mean.molecules.iter_mut().enumerate() {
            for i in 0..mol.len() {
                let positions: Option<Vec<Point3<f64>>> = self
                    .models
                    .iter()
                    .map(|m| m.molecules[mol_index].position(i))
                    .collect();
                let Some(positions) = positions else {
                    continue;
                };
                let sum = positions
                    .iter()
                    .fold(Vector3::zeros(), |acc, p| acc + p.coords);
                mol.set_position(i, Point3::from(sum / count))?;
            }
        }

        debug!(models = self.models.len(), "Replaced the ensemble by its mean structure.");
        self.models = vec![mean];
        Ok(())
    }

    /// Stores freshly decoded models according to the load options.
    ///
    /// Names and model numbers are resolved and checked for collisions before anything is stored,
    /// so a failed load leaves the ensemble untouched.
    pub(crate) fn pack(
        &mut self,
        loaded: Vec<LoadedModel>,
        options: &LoadOptions,
    ) -> Result<(), StructureError> {
        if let Some(numbers) = &options.set_model_num {
            if numbers.len() != loaded.len() {
                return Err(StructureError::Mapping(format!(
                    "{} model numbers given for {} loaded models",
                    numbers.len(),
                    loaded.len()
                )));
            }
        }

        let existing = self.num_molecules();
        let stem = options
            .source_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILE_STEM.to_string());

        let mut plan = Vec::with_capacity(loaded.len());
        for (model_index, lm) in loaded.iter().enumerate() {
            let target = options
                .set_model_num
                .as_ref()
                .map_or(lm.number, |numbers| Some(numbers[model_index]));

            if let Some(given) = &options.set_mol_name {
                if given.len() != lm.molecules.len() {
                    return Err(StructureError::Mapping(format!(
                        "{} molecule names given but model {:?} holds {} molecules",
                        given.len(),
                        lm.number,
                        lm.molecules.len()
                    )));
                }
            }
            let names: Vec<String> = lm
                .molecules
                .iter()
                .enumerate()
                .map(|(mol_index, lmol)| match &options.set_mol_name {
                    Some(given) => given[mol_index].clone(),
                    None => format!("{stem}_mol{}", lmol.file_mol_num + existing),
                })
                .collect();

            let mut seen: HashSet<&str> = self
                .model(target)
                .map(|m| m.molecules.iter().map(|mol| mol.name.as_str()).collect())
                .unwrap_or_default();
            for name in &names {
                if !seen.insert(name.as_str()) {
                    return Err(StructureError::MoleculeExists {
                        name: name.clone(),
                        model: target,
                    });
                }
            }
            plan.push((target, names));
        }

        let base_source = options.source_path.as_ref().map(|path| Source {
            file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            file_path: Some(path.clone()),
            file_path_abs: std::fs::canonicalize(path).ok(),
            file_model: None,
            file_mol_num: None,
        });

        for (lm, (target, names)) in loaded.into_iter().zip(plan) {
            let model_index = match self.models.iter().position(|m| m.number == target) {
                Some(i) => i,
                None => {
                    self.models.push(Model::new(target));
                    self.models.len() - 1
                }
            };

            for (lmol, name) in lm.molecules.into_iter().zip(names) {
                let mut mol = lmol.molecule;
                mol.name = name;
                let mut source = base_source.clone().unwrap_or_default();
                source.file_model = lm.number;
                source.file_mol_num = Some(lmol.file_mol_num);
                mol.source = Some(source);
                debug!(molecule = %mol.name, model = ?target, atoms = mol.len(), "Stored molecule.");
                self.models[model_index].molecules.push(mol);
            }
        }
        Ok(())
    }

    fn ensure_molecule(&mut self, mol_name: &str) -> Result<(), StructureError> {
        let present = self
            .models
            .first()
            .is_some_and(|m| m.molecule(mol_name).is_some());
        if !present {
            self.add_molecule(None, mol_name)?;
        }
        Ok(())
    }

    fn resolve_model_index(&self, model: Option<isize>) -> Result<Option<usize>, StructureError> {
        match model {
            Some(n) => Ok(self.models.iter().position(|m| m.number == Some(n))),
            None if self.models.len() > 1 => {
                Err(StructureError::ModelTargetAmbiguous(self.models.len()))
            }
            None => Ok(if self.models.is_empty() { None } else { Some(0) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::LoadedMolecule;
    use std::path::PathBuf;

    fn atom(name: &str, x: f64) -> AtomRecord {
        AtomRecord::new(name, Point3::new(x, 0.0, 0.0))
    }

    fn two_model_ensemble() -> Ensemble {
        let mut ensemble = Ensemble::new();
        ensemble.add_molecule(Some(1), "lig").unwrap();
        ensemble.add_atom("lig", atom("C1", 0.0)).unwrap();
        ensemble.add_atom("lig", atom("C2", 1.5)).unwrap();
        ensemble.add_model(Some(2), None).unwrap();
        ensemble
    }

    fn loaded(number: Option<isize>, molecules: usize) -> LoadedModel {
        LoadedModel {
            number,
            molecules: (1..=molecules)
                .map(|n| {
                    let mut molecule = Molecule::new("");
                    molecule.add_atom(atom("C", n as f64));
                    LoadedMolecule {
                        file_mol_num: n,
                        molecule,
                    }
                })
                .collect(),
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn add_molecule_to_empty_ensemble_creates_model() {
            let mut ensemble = Ensemble::new();
            ensemble.add_molecule(None, "lig").unwrap();

            assert_eq!(ensemble.num_models(), 1);
            assert_eq!(ensemble.model_numbers(), vec![None]);
            assert_eq!(ensemble.num_molecules(), 1);
        }

        #[test]
        fn add_molecule_twice_fails() {
            let mut ensemble = Ensemble::new();
            ensemble.add_molecule(None, "lig").unwrap();
            let err = ensemble.add_molecule(None, "lig").unwrap_err();
            assert!(matches!(err, StructureError::MoleculeExists { .. }));
        }

        #[test]
        fn add_atom_creates_missing_molecule_in_every_model() {
            let mut ensemble = two_model_ensemble();
            let index = ensemble.add_atom("water", atom("O", 3.0)).unwrap();

            assert_eq!(index, 0);
            for model in ensemble.models() {
                assert_eq!(model.molecule("water").unwrap().len(), 1);
            }
        }

        #[test]
        fn add_atom_per_model_uses_each_position() {
            let mut ensemble = two_model_ensemble();
            let index = ensemble
                .add_atom_per_model(
                    "lig",
                    AtomRecord::default(),
                    &[Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)],
                )
                .unwrap();

            assert_eq!(index, 2);
            let m1 = ensemble.get_molecule("lig", Some(1)).unwrap().unwrap();
            let m2 = ensemble.get_molecule("lig", Some(2)).unwrap().unwrap();
            assert_eq!(m1.position(2), Some(Point3::new(1.0, 1.0, 1.0)));
            assert_eq!(m2.position(2), Some(Point3::new(2.0, 2.0, 2.0)));
        }

        #[test]
        fn add_atom_per_model_requires_one_position_per_model() {
            let mut ensemble = two_model_ensemble();
            let err = ensemble
                .add_atom_per_model("lig", AtomRecord::default(), &[Point3::origin()])
                .unwrap_err();
            assert_eq!(
                err,
                StructureError::PositionCount {
                    expected: 2,
                    found: 1
                }
            );
        }

        #[test]
        fn connect_atom_applies_to_every_model() {
            let mut ensemble = two_model_ensemble();
            ensemble.connect_atom("lig", 0, 1).unwrap();

            for model in ensemble.models() {
                let mol = model.molecule("lig").unwrap();
                assert_eq!(mol.bonded(0), &[1]);
                assert_eq!(mol.bonded(1), &[0]);
            }
        }

        #[test]
        fn connect_atom_on_missing_molecule_fails() {
            let mut ensemble = two_model_ensemble();
            assert_eq!(
                ensemble.connect_atom("nope", 0, 1),
                Err(StructureError::MoleculeNotFound("nope".to_string()))
            );
            assert_eq!(
                Ensemble::new().connect_atom("lig", 0, 1),
                Err(StructureError::NoStructureLoaded)
            );
        }
    }

    mod models {
        use super::*;

        #[test]
        fn add_model_copies_first_model() {
            let ensemble = two_model_ensemble();
            assert_eq!(ensemble.num_models(), 2);
            assert_eq!(
                ensemble.models()[0].molecules,
                ensemble.models()[1].molecules
            );
        }

        #[test]
        fn add_model_from_named_source() {
            let mut ensemble = two_model_ensemble();
            ensemble
                .get_molecule_mut("lig", Some(2))
                .unwrap()
                .unwrap()
                .x[0] = Some(10.0);

            ensemble.add_model(Some(3), Some(2)).unwrap();
            let mol = ensemble.get_molecule("lig", Some(3)).unwrap().unwrap();
            assert_eq!(mol.x[0], Some(10.0));
        }

        #[test]
        fn add_model_rejects_duplicates_and_unknown_sources() {
            let mut ensemble = two_model_ensemble();
            assert_eq!(
                ensemble.add_model(Some(1), None),
                Err(StructureError::ModelExists(1))
            );
            assert_eq!(
                ensemble.add_model(Some(5), Some(9)),
                Err(StructureError::ModelNotFound(Some(9)))
            );
        }

        #[test]
        fn model_loop_sorts_numbered_models() {
            let mut ensemble = Ensemble::new();
            ensemble.add_model(Some(3), None).unwrap();
            ensemble.add_model(Some(1), None).unwrap();
            ensemble.add_model(Some(2), None).unwrap();

            let numbers: Vec<_> = ensemble.model_loop(None).map(|m| m.number).collect();
            assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);

            let filtered: Vec<_> = ensemble.model_loop(Some(2)).map(|m| m.number).collect();
            assert_eq!(filtered, vec![Some(2)]);
            assert_eq!(ensemble.model_loop(Some(7)).count(), 0);
        }

        #[test]
        fn get_molecule_requires_model_number_with_several_models() {
            let ensemble = two_model_ensemble();
            assert_eq!(
                ensemble.get_molecule("lig", None),
                Err(StructureError::ModelTargetAmbiguous(2))
            );
            assert!(ensemble.get_molecule("lig", Some(1)).unwrap().is_some());
            assert!(ensemble.get_molecule("lig", Some(9)).unwrap().is_none());
        }

        #[test]
        fn delete_single_model_and_everything() {
            let mut ensemble = two_model_ensemble();
            ensemble.delete(Some(1)).unwrap();
            assert_eq!(ensemble.model_numbers(), vec![Some(2)]);
            assert_eq!(
                ensemble.delete(Some(1)),
                Err(StructureError::ModelNotFound(Some(1)))
            );

            ensemble.delete(None).unwrap();
            assert!(ensemble.is_empty());
        }
    }

    mod reshaping {
        use super::*;

        #[test]
        fn set_model_renumbers_and_checks_collisions() {
            let mut ensemble = two_model_ensemble();
            assert_eq!(ensemble.set_model(Some(1), 2), Err(StructureError::ModelExists(2)));
            assert_eq!(
                ensemble.set_model(Some(8), 9),
                Err(StructureError::ModelNotFound(Some(8)))
            );

            ensemble.set_model(Some(2), 5).unwrap();
            assert_eq!(ensemble.model_numbers(), vec![Some(1), Some(5)]);
        }

        #[test]
        fn set_model_numbers_the_only_unnumbered_model() {
            let mut ensemble = Ensemble::new();
            ensemble.add_atom("lig", atom("C1", 0.0)).unwrap();
            ensemble.set_model(None, 1).unwrap();
            assert_eq!(ensemble.model_numbers(), vec![Some(1)]);
        }

        #[test]
        fn collapse_keeps_one_model() {
            let mut ensemble = two_model_ensemble();
            ensemble.add_model(Some(3), None).unwrap();
            ensemble.collapse_ensemble(2, 1).unwrap();

            assert_eq!(ensemble.model_numbers(), vec![Some(1)]);
            assert!(ensemble.has_molecule("lig"));
            assert_eq!(
                ensemble.collapse_ensemble(4, 1),
                Err(StructureError::ModelNotFound(Some(4)))
            );
        }

        #[test]
        fn mean_averages_positions_over_models() {
            let mut ensemble = two_model_ensemble();
            ensemble
                .get_molecule_mut("lig", Some(2))
                .unwrap()
                .unwrap()
                .set_position(1, Point3::new(2.5, 1.0, -1.0))
                .unwrap();

            ensemble.mean().unwrap();
            assert_eq!(ensemble.model_numbers(), vec![None]);
            let mol = ensemble.get_molecule("lig", None).unwrap().unwrap();
            assert_eq!(mol.position(0), Some(Point3::new(0.0, 0.0, 0.0)));
            assert_eq!(mol.position(1), Some(Point3::new(2.0, 0.5, -0.5)));
        }

        #[test]
        fn mean_of_empty_ensemble_fails() {
            assert_eq!(Ensemble::new().mean(), Err(StructureError::NoStructureLoaded));
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn consistent_models_validate() {
            let ensemble = two_model_ensemble();
            assert!(ensemble.validate().is_ok());
            assert!(ensemble.validate_models().is_ok());
        }

        #[test]
        fn differing_molecule_names_fail_validation() {
            let mut ensemble = two_model_ensemble();
            ensemble.models_mut()[1].molecules[0].name = "other".to_string();
            assert!(matches!(
                ensemble.validate(),
                Err(StructureError::InconsistentModels(_))
            ));
        }

        #[test]
        fn differing_atom_identity_fails_model_validation() {
            let mut ensemble = two_model_ensemble();
            ensemble.models_mut()[1].molecules[0].atom_name[1] = Some("CX".to_string());
            assert_eq!(
                ensemble.validate_models(),
                Err(StructureError::ModelAtomMismatch {
                    molecule: "lig".to_string(),
                    index: 1,
                    first: Some(1),
                    other: Some(2),
                })
            );
        }
    }

    mod packing {
        use super::*;

        #[test]
        fn default_names_use_file_stem_and_molecule_number() {
            let mut ensemble = Ensemble::new();
            let options = LoadOptions {
                source_path: Some(PathBuf::from("data/1abc.pdb")),
                ..Default::default()
            };
            ensemble.pack(vec![loaded(None, 2)], &options).unwrap();

            let names: Vec<_> = ensemble.models()[0]
                .molecules
                .iter()
                .map(|m| m.name.clone())
                .collect();
            assert_eq!(names, vec!["1abc_mol1", "1abc_mol2"]);

            let source = ensemble.models()[0].molecules[1].source.clone().unwrap();
            assert_eq!(source.file_name.as_deref(), Some("1abc.pdb"));
            assert_eq!(source.file_mol_num, Some(2));
        }

        #[test]
        fn default_names_are_offset_by_existing_molecules() {
            let mut ensemble = Ensemble::new();
            ensemble.pack(vec![loaded(None, 2)], &LoadOptions::default()).unwrap();
            ensemble.pack(vec![loaded(None, 1)], &LoadOptions::default()).unwrap();

            let names: Vec<_> = ensemble.models()[0]
                .molecules
                .iter()
                .map(|m| m.name.as_str())
                .collect();
            assert_eq!(names, vec!["structure_mol1", "structure_mol2", "structure_mol3"]);
        }

        #[test]
        fn explicit_names_and_model_numbers_are_applied() {
            let mut ensemble = Ensemble::new();
            let options = LoadOptions {
                set_mol_name: Some(vec!["a".to_string(), "b".to_string()]),
                set_model_num: Some(vec![5, 6]),
                ..Default::default()
            };
            ensemble
                .pack(vec![loaded(Some(1), 2), loaded(Some(2), 2)], &options)
                .unwrap();

            assert_eq!(ensemble.model_numbers(), vec![Some(5), Some(6)]);
            assert!(ensemble.get_molecule("b", Some(6)).unwrap().is_some());
        }

        #[test]
        fn mapping_length_mismatch_is_rejected() {
            let mut ensemble = Ensemble::new();
            let options = LoadOptions {
                set_model_num: Some(vec![1]),
                ..Default::default()
            };
            let err = ensemble
                .pack(vec![loaded(Some(1), 1), loaded(Some(2), 1)], &options)
                .unwrap_err();
            assert!(matches!(err, StructureError::Mapping(_)));
            assert!(ensemble.is_empty());
        }

        #[test]
        fn name_collision_leaves_ensemble_untouched() {
            let mut ensemble = Ensemble::new();
            let options = LoadOptions {
                set_mol_name: Some(vec!["lig".to_string()]),
                ..Default::default()
            };
            ensemble.pack(vec![loaded(None, 1)], &options).unwrap();

            let err = ensemble.pack(vec![loaded(None, 1)], &options).unwrap_err();
            assert_eq!(
                err,
                StructureError::MoleculeExists {
                    name: "lig".to_string(),
                    model: None
                }
            );
            assert_eq!(ensemble.num_molecules(), 1);
        }
    }
}
