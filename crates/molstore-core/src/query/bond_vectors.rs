use super::BondWarning;
use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::model::Model;
use crate::core::models::molecule::Molecule;
use crate::core::selection::{Selection, SelectionMatcher};
use crate::core::topology::connectivity;
use nalgebra::{Point3, Vector3};
use tracing::debug;

const SELECTION_PREFIXES: [char; 3] = ['#', ':', '@'];

/// Identifies base atoms and the attached atom whose bond vectors are wanted.
///
/// The base atom of a molecule is its first atom matching every given identifier. `attached` is a
/// wildcard pattern for the name of the partner atom; a pattern written as a selection (starting
/// with `#`, `:` or `@`) may also resolve to an atom that is not directly bonded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondVectorQuery {
    pub attached: String,
    pub model_num: Option<isize>,
    pub mol_name: Option<String>,
    pub res_num: Option<isize>,
    pub res_name: Option<String>,
    pub atom_num: Option<isize>,
    pub atom_name: Option<String>,
}

impl BondVectorQuery {
    pub fn new(attached: &str) -> Self {
        Self {
            attached: attached.to_string(),
            ..Default::default()
        }
    }

    fn is_base_atom(&self, mol: &Molecule, index: usize) -> bool {
        (self.res_num.is_none() || mol.res_num[index] == self.res_num)
            && (self.res_name.is_none() || mol.res_name[index] == self.res_name)
            && (self.atom_num.is_none() || mol.atom_num[index] == self.atom_num)
            && (self.atom_name.is_none() || mol.atom_name[index] == self.atom_name)
    }
}

/// The vectors from base atom to attached atom, one per model and molecule where one was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondVectors {
    pub vectors: Vec<Vector3<f64>>,
    /// The name of the last attached atom found.
    pub attached_name: Option<String>,
    pub warnings: Vec<BondWarning>,
}

/// Resolves a selection-style pattern against every atom of a model.
fn global_lookup(model: &Model, pattern: &str) -> Result<(Point3<f64>, String), BondWarning> {
    let not_found = || BondWarning::NotFound {
        pattern: pattern.to_string(),
    };
    let selection: Selection = pattern.parse().map_err(|_| not_found())?;

    let mut matches = Vec::new();
    for mol in &model.molecules {
        if !selection.matches_molecule(&mol.name) {
            continue;
        }
        for i in 0..mol.len() {
            if selection.matches_atom(
                mol.atom_num[i],
                mol.atom_name[i].as_deref(),
                mol.res_num[i],
                mol.res_name[i].as_deref(),
                &mol.name,
            ) {
                matches.push((mol, i));
            }
        }
    }

    match matches.as_slice() {
        [(mol, i)] => {
            let position = mol.position(*i).ok_or_else(|| BondWarning::MissingPosition {
                molecule: mol.name.clone(),
                index: *i,
            })?;
            Ok((position, mol.atom_name[*i].clone().unwrap_or_default()))
        }
        [] => Err(not_found()),
        several => Err(BondWarning::Ambiguous {
            names: several
                .iter()
                .map(|(mol, i)| mol.atom_name[*i].clone().unwrap_or_default())
                .collect(),
        }),
    }
}

impl Ensemble {
    /// Computes the bond vectors described by `query`.
    ///
    /// Base atoms are located in the first model and the same atom index is used in every visited
    /// model. Bonds are inferred on demand for base atoms that have none. A model in which no single
    /// attached atom can be found contributes a warning instead of a vector, and the remaining
    /// models are still processed.
    pub fn bond_vectors(&mut self, query: &BondVectorQuery) -> Result<BondVectors, StructureError> {
        if self.is_empty() {
            return Err(StructureError::NoStructureLoaded);
        }
        let config = *self.config();
        let selection_like = query.attached.starts_with(SELECTION_PREFIXES);
        let visited = self.model_indices(query.model_num);
        for &model_index in std::iter::once(&0).chain(&visited) {
            for mol in &self.models()[model_index].molecules {
                mol.validate_arrays()?;
            }
        }
        let mut result = BondVectors::default();

        for mol_index in 0..self.models()[0].molecules.len() {
            let first = &self.models()[0].molecules[mol_index];
            if query.mol_name.as_ref().is_some_and(|name| *name != first.name) {
                continue;
            }
            let Some(base) = (0..first.len()).find(|&i| query.is_base_atom(first, i)) else {
                result.warnings.push(BondWarning::BaseAtomNotFound {
                    molecule: first.name.clone(),
                });
                continue;
            };

            for &model_index in &visited {
                let Some(mol) = self.models_mut()[model_index].molecules.get_mut(mol_index) else {
                    continue;
                };
                let molecule = mol.name.clone();

                let resolved = match connectivity::bonded_atom(mol, base, &query.attached, &config) {
                    Ok(partner) => mol
                        .position(partner)
                        .map(|p| (p, mol.atom_name[partner].clone().unwrap_or_default()))
                        .ok_or(BondWarning::MissingPosition {
                            molecule: molecule.clone(),
                            index: partner,
                        }),
                    Err(BondWarning::NotFound { .. }) if selection_like => {
                        global_lookup(&self.models()[model_index], &query.attached)
                    }
                    Err(warning) => Err(warning),
                };

                let base_position = self.models()[model_index].molecules[mol_index].position(base);
                match (resolved, base_position) {
                    (Ok((partner, name)), Some(origin)) => {
                        result.vectors.push(partner - origin);
                        result.attached_name = Some(name);
                    }
                    (Ok(_), None) => result.warnings.push(BondWarning::MissingPosition {
                        molecule,
                        index: base,
                    }),
                    (Err(warning), _) => {
                        debug!(molecule = %molecule, %warning, "No bond vector for model.");
                        result.warnings.push(warning);
                    }
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomRecord;

    fn atom(name: &str, element: &str, res: isize, pos: [f64; 3]) -> AtomRecord {
        AtomRecord::new(name, Point3::new(pos[0], pos[1], pos[2]))
            .with_element(element)
            .with_residue(res, "GLY")
    }

    /// A glycine backbone fragment, with a second model shifted along z.
    fn glycine(models: usize) -> Ensemble {
        let mut ensemble = Ensemble::new();
        for n in 1..=models {
            ensemble.add_model(Some(n as isize), None).unwrap();
        }
        let shifts: Vec<f64> = (0..models).map(|n| n as f64).collect();
        let per_model = |pos: [f64; 3]| -> Vec<Point3<f64>> {
            shifts
                .iter()
                .map(|dz| Point3::new(pos[0], pos[1], pos[2] + dz))
                .collect()
        };
        for (name, element, pos) in [
            ("N", "N", [0.0, 0.0, 0.0]),
            ("H", "H", [-0.5, 0.85, 0.0]),
            ("CA", "C", [1.45, 0.0, 0.0]),
            ("HA", "H", [1.8, 1.0, 0.0]),
        ] {
            ensemble
                .add_atom_per_model("gly", atom(name, element, 1, [0.0; 3]), &per_model(pos))
                .unwrap();
        }
        ensemble
    }

    #[test]
    fn vector_from_nitrogen_to_hydrogen() {
        let mut ensemble = glycine(1);
        let query = BondVectorQuery {
            atom_name: Some("N".to_string()),
            ..BondVectorQuery::new("H")
        };
        let result = ensemble.bond_vectors(&query).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.vectors, vec![Vector3::new(-0.5, 0.85, 0.0)]);
        assert_eq!(result.attached_name.as_deref(), Some("H"));
    }

    #[test]
    fn one_vector_per_model() {
        let mut ensemble = glycine(2);
        let query = BondVectorQuery {
            atom_name: Some("CA".to_string()),
            ..BondVectorQuery::new("HA")
        };
        let result = ensemble.bond_vectors(&query).unwrap();
        assert_eq!(result.vectors.len(), 2);
        assert_eq!(result.vectors[0], result.vectors[1]);

        let only_second = BondVectorQuery {
            model_num: Some(2),
            ..query
        };
        assert_eq!(ensemble.bond_vectors(&only_second).unwrap().vectors.len(), 1);
    }

    #[test]
    fn ambiguous_partner_warns_per_model_and_continues() {
        let mut ensemble = Ensemble::new();
        ensemble.add_model(Some(1), None).unwrap();
        ensemble.add_model(Some(2), None).unwrap();
        for (name, x) in [("C1", 0.0), ("O1", 1.2), ("O2", -1.2)] {
            ensemble
                .add_atom("lig", atom(name, &name[..1], 1, [x, 0.0, 0.0]).with_residue(1, "LIG"))
                .unwrap();
        }
        ensemble.connect_atom("lig", 0, 1).unwrap();
        ensemble.connect_atom("lig", 0, 2).unwrap();
        ensemble
            .get_molecule_mut("lig", Some(2))
            .unwrap()
            .unwrap()
            .atom_name[2] = Some("N2".to_string());

        let query = BondVectorQuery {
            atom_name: Some("C1".to_string()),
            ..BondVectorQuery::new("O*")
        };
        let result = ensemble.bond_vectors(&query).unwrap();

        assert_eq!(
            result.warnings,
            vec![BondWarning::Ambiguous {
                names: vec!["O1".to_string(), "O2".to_string()]
            }]
        );
        assert_eq!(result.vectors, vec![Vector3::new(1.2, 0.0, 0.0)]);
    }

    #[test]
    fn missing_base_atom_is_a_warning() {
        let mut ensemble = glycine(1);
        let query = BondVectorQuery {
            atom_name: Some("CB".to_string()),
            ..BondVectorQuery::new("HB*")
        };
        let result = ensemble.bond_vectors(&query).unwrap();
        assert!(result.vectors.is_empty());
        assert_eq!(
            result.warnings,
            vec![BondWarning::BaseAtomNotFound {
                molecule: "gly".to_string()
            }]
        );
    }

    #[test]
    fn selection_pattern_falls_back_to_global_lookup() {
        let mut ensemble = glycine(1);
        ensemble
            .add_atom("ion", atom("MG", "MG", 2, [0.0, 0.0, 3.0]).with_residue(2, "MG"))
            .unwrap();
        let query = BondVectorQuery {
            mol_name: Some("gly".to_string()),
            atom_name: Some("N".to_string()),
            ..BondVectorQuery::new("#ion@MG")
        };
        let result = ensemble.bond_vectors(&query).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.vectors, vec![Vector3::new(0.0, 0.0, 3.0)]);
        assert_eq!(result.attached_name.as_deref(), Some("MG"));
    }

    #[test]
    fn uneven_arrays_in_a_visited_model_are_rejected() {
        let mut ensemble = glycine(2);
        ensemble
            .get_molecule_mut("gly", Some(2))
            .unwrap()
            .unwrap()
            .res_num
            .pop();
        let query = BondVectorQuery {
            atom_name: Some("CA".to_string()),
            ..BondVectorQuery::new("HA")
        };

        assert!(matches!(
            ensemble.bond_vectors(&query),
            Err(StructureError::InvalidArrayLengths { .. })
        ));

        let first_only = BondVectorQuery {
            model_num: Some(1),
            ..query
        };
        assert!(ensemble.bond_vectors(&first_only).is_ok());
    }

    #[test]
    fn uneven_arrays_in_the_first_model_are_rejected() {
        let mut ensemble = glycine(1);
        ensemble
            .get_molecule_mut("gly", None)
            .unwrap()
            .unwrap()
            .atom_name
            .pop();
        assert!(matches!(
            ensemble.bond_vectors(&BondVectorQuery::new("H")),
            Err(StructureError::InvalidArrayLengths { .. })
        ));
    }

    #[test]
    fn empty_ensemble_is_rejected() {
        assert_eq!(
            Ensemble::new().bond_vectors(&BondVectorQuery::new("H")),
            Err(StructureError::NoStructureLoaded)
        );
    }
}
