use super::atom_loop::AtomInfo;
use crate::core::models::error::StructureError;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Writes atom-loop results as CSV with a header row, returning the number of rows written.
///
/// Fields that were not requested are left empty. The first loop error stops the export.
pub fn write_atom_table<W: Write>(
    atoms: impl IntoIterator<Item = Result<AtomInfo, StructureError>>,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for atom in atoms {
        csv.serialize(atom?)?;
        rows += 1;
    }
    csv.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomRecord;
    use crate::core::models::ensemble::Ensemble;
    use crate::core::selection::AllAtoms;
    use crate::query::atom_loop::{AtomFields, AtomLoopOptions};
    use nalgebra::Point3;

    #[test]
    fn rows_follow_the_header() {
        let mut ensemble = Ensemble::new();
        ensemble
            .add_atom(
                "lig",
                AtomRecord::new("C1", Point3::new(1.5, -2.0, 0.0))
                    .with_number(1)
                    .with_element("C"),
            )
            .unwrap();
        let options = AtomLoopOptions {
            fields: AtomFields::ALL,
            ..Default::default()
        };

        let mut out = Vec::new();
        let rows = write_atom_table(ensemble.atom_loop(&AllAtoms, options).unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(rows, 1);
        assert_eq!(
            lines[0],
            "model_num,mol_name,res_num,res_name,atom_num,atom_name,element,x,y,z"
        );
        assert_eq!(lines[1], ",lig,,,1,C1,C,1.5,-2.0,0.0");
    }

    #[test]
    fn loop_errors_stop_the_export() {
        let atoms = vec![
            Ok(AtomInfo::default()),
            Err(StructureError::NoStructureLoaded),
        ];
        let err = write_atom_table(atoms, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Structure(StructureError::NoStructureLoaded)
        ));
    }
}
