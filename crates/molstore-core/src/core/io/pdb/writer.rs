use super::PdbError;
use crate::core::models::atom::RecordKind;
use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::model::Model;
use crate::core::models::molecule::Molecule;
use crate::core::topology::elements;
use std::io::Write;
use tracing::{debug, info, instrument};

const REMARKS: [(u32, &str); 2] = [
    (4, "THIS FILE COMPLIES WITH FORMAT V. 3.30, JUL-2011."),
    (40, "CREATED USING MOLSTORE."),
];
const MAX_CONECT_PARTNERS: usize = 4;
const WATER: &str = "HOH";
const UNKNOWN_ELEMENT: &str = "X";

/// A non-standard residue described by the HET, HETNAM and FORMUL records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heterogen {
    pub res_num: Option<isize>,
    pub res_name: String,
    pub chain_id: String,
    pub atom_count: usize,
    /// Atom counts per element, in order of first appearance.
    pub element_counts: Vec<(String, usize)>,
}

impl Heterogen {
    /// The chemical formula, such as `C3H2`.
    pub fn formula(&self) -> String {
        self.element_counts
            .iter()
            .map(|(element, count)| format!("{element}{count}"))
            .collect()
    }

    fn count(&mut self, element: Option<&str>) {
        self.atom_count += 1;
        let element = element.unwrap_or(UNKNOWN_ELEMENT);
        match self.element_counts.iter_mut().find(|(e, _)| e == element) {
            Some((_, count)) => *count += 1,
            None => self.element_counts.push((element.to_string(), 1)),
        }
    }
}

/// Groups the HETATM atoms of a molecule into residues.
///
/// Consecutive HETATM atoms sharing a residue number form one residue. Atoms without a residue
/// name and waters are left out.
fn molecule_heterogens(mol: &Molecule) -> Vec<Heterogen> {
    let mut residues: Vec<Heterogen> = Vec::new();
    for i in 0..mol.len() {
        if mol.record[i] != Some(RecordKind::Hetatm) {
            continue;
        }
        let Some(res_name) = mol.res_name[i].as_deref() else {
            continue;
        };
        if res_name == WATER {
            continue;
        }

        let res_num = mol.res_num[i];
        if residues.last().is_none_or(|h| h.res_num != res_num) {
            residues.push(Heterogen {
                res_num,
                res_name: res_name.to_string(),
                chain_id: mol.chain_id[i].clone().unwrap_or_default(),
                atom_count: 0,
                element_counts: Vec::new(),
            });
        }
        if let Some(current) = residues.last_mut() {
            current.count(mol.element[i].as_deref());
        }
    }
    residues
}

impl Model {
    /// Collects the heterogen residues of all molecules.
    ///
    /// A residue number found in several molecules must describe the same residue every time.
    pub fn heterogens(&self) -> Result<Vec<Heterogen>, PdbError> {
        let mut collected: Vec<Heterogen> = Vec::new();
        for mol in &self.molecules {
            for het in molecule_heterogens(mol) {
                match collected.iter().find(|h| h.res_num == het.res_num) {
                    Some(existing) if *existing != het => {
                        return Err(PdbError::HeterogenMismatch {
                            res_num: het.res_num,
                            res_name: het.res_name.clone(),
                            details: format!(
                                "molecule '{}' describes it as {} {} atoms ({}), previously {} {} atoms ({})",
                                mol.name,
                                het.res_name,
                                het.atom_count,
                                het.formula(),
                                existing.res_name,
                                existing.atom_count,
                                existing.formula()
                            ),
                        });
                    }
                    Some(_) => {}
                    None => collected.push(het),
                }
            }
        }
        Ok(collected)
    }
}

fn put(writer: &mut impl Write, line: &str) -> Result<(), PdbError> {
    writeln!(writer, "{line:<80}")?;
    Ok(())
}

fn atom_line(mol: &Molecule, index: usize, serial: isize, kind: RecordKind) -> String {
    let name = mol.atom_name[index].as_deref().unwrap_or("");
    let name = if name.len() == 1 {
        format!(" {name}")
    } else {
        name.to_string()
    };
    format!(
        "{:<6}{:>5} {:<4}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}      {:<4}{:>2}{:>2}",
        kind,
        serial,
        name,
        "",
        mol.res_name[index].as_deref().unwrap_or(""),
        mol.chain_id[index].as_deref().unwrap_or(""),
        mol.res_num[index].unwrap_or(0),
        "",
        mol.x[index].unwrap_or(0.0),
        mol.y[index].unwrap_or(0.0),
        mol.z[index].unwrap_or(0.0),
        1.0,
        0.0,
        mol.segment_id[index].as_deref().unwrap_or(""),
        mol.element[index].as_deref().unwrap_or(""),
        "",
    )
}

fn is_hetatm(mol: &Molecule, index: usize) -> bool {
    mol.record[index] == Some(RecordKind::Hetatm)
}

/// Atom indices of a molecule in written order: ATOM records first, then HETATM records.
fn written_order(mol: &Molecule) -> impl Iterator<Item = usize> + '_ {
    (0..mol.len())
        .filter(|&i| !is_hetatm(mol, i))
        .chain((0..mol.len()).filter(|&i| is_hetatm(mol, i)))
}

/// Serial numbers assigned to every atom of a model, per molecule.
///
/// An atom keeps its stored atom number. An atom without one takes the running serial, which
/// follows the previous record written: the ATOM records of a molecule, its TER record, then its
/// HETATM records, continuing into the next molecule.
fn serial_numbers(model: &Model) -> Vec<Vec<isize>> {
    let mut next = 1;
    model
        .molecules
        .iter()
        .map(|mol| {
            let mut serials = vec![0; mol.len()];
            let mut assign = |i: usize, next: &mut isize| {
                serials[i] = mol.atom_num[i].unwrap_or(*next);
                *next = serials[i] + 1;
            };
            let mut atom_records = false;
            for i in (0..mol.len()).filter(|&i| !is_hetatm(mol, i)) {
                assign(i, &mut next);
                atom_records = true;
            }
            if atom_records {
                next += 1;
            }
            for i in (0..mol.len()).filter(|&i| is_hetatm(mol, i)) {
                assign(i, &mut next);
            }
            serials
        })
        .collect()
}

#[derive(Debug, Default)]
struct RecordCounts {
    coord: usize,
    ter: usize,
    conect: usize,
}

fn write_model(
    writer: &mut impl Write,
    model: &Model,
    serials: &[Vec<isize>],
    counts: &mut RecordCounts,
) -> Result<(), PdbError> {
    for (mol, mol_serials) in model.molecules.iter().zip(serials) {
        let mut last_atom = None;
        for i in (0..mol.len()).filter(|&i| !is_hetatm(mol, i)) {
            put(writer, &atom_line(mol, i, mol_serials[i], RecordKind::Atom))?;
            counts.coord += 1;
            last_atom = Some(i);
        }

        if let Some(last) = last_atom {
            let ter = format!(
                "{:<6}{:>5}      {:>3} {:1}{:>4}{:1}",
                "TER",
                mol_serials[last] + 1,
                mol.res_name[last].as_deref().unwrap_or(""),
                mol.chain_id[last].as_deref().unwrap_or(""),
                mol.res_num[last].unwrap_or(0),
                "",
            );
            put(writer, &ter)?;
            counts.ter += 1;
        }

        for i in (0..mol.len()).filter(|&i| is_hetatm(mol, i)) {
            put(writer, &atom_line(mol, i, mol_serials[i], RecordKind::Hetatm))?;
            counts.coord += 1;
        }
    }
    Ok(())
}

fn write_conect(
    writer: &mut impl Write,
    model: &Model,
    serials: &[Vec<isize>],
    counts: &mut RecordCounts,
) -> Result<(), PdbError> {
    for (mol, mol_serials) in model.molecules.iter().zip(serials) {
        for i in written_order(mol) {
            for partners in mol.bonded(i).chunks(MAX_CONECT_PARTNERS) {
                let mut line = format!("{:<6}{:>5}", "CONECT", mol_serials[i]);
                for &j in partners {
                    line.push_str(&format!("{:>5}", mol_serials[j]));
                }
                put(writer, &line)?;
                counts.conect += 1;
            }
        }
    }
    Ok(())
}

/// Writes the requested model, or every model, as a complete PDB file.
///
/// CONECT records describe the first model written, so a `model_num` filter writes the bonds of
/// that model rather than those of the first model in the ensemble.
#[instrument(skip_all, name = "pdb_writer", fields(model = ?model_num))]
pub(super) fn write_pdb(
    ensemble: &Ensemble,
    model_num: Option<isize>,
    writer: &mut impl Write,
) -> Result<(), PdbError> {
    if ensemble.is_empty() {
        return Err(StructureError::NoStructureLoaded.into());
    }
    let indices = ensemble.model_indices(model_num);
    if indices.is_empty() {
        return Err(StructureError::ModelNotFound(model_num).into());
    }

    ensemble.validate()?;
    for &i in &indices {
        for mol in &ensemble.models()[i].molecules {
            mol.validate_arrays()?;
        }
    }

    let models = ensemble.models();
    let heterogens = models[0].heterogens()?;
    for model in &models[1..] {
        let other = model.heterogens()?;
        if other == heterogens {
            continue;
        }
        let differing = heterogens
            .iter()
            .zip(&other)
            .find(|(a, b)| a != b)
            .map(|(_, b)| b)
            .or_else(|| other.get(heterogens.len()))
            .or_else(|| heterogens.get(other.len()));
        return Err(PdbError::HeterogenMismatch {
            res_num: differing.and_then(|h| h.res_num),
            res_name: differing.map(|h| h.res_name.clone()).unwrap_or_default(),
            details: format!(
                "model {:?} has {} heterogen residues that differ from the {} of model {:?}",
                model.number,
                other.len(),
                heterogens.len(),
                models[0].number
            ),
        });
    }

    for (num, text) in REMARKS {
        put(writer, &format!("{:<6} {:>3} {:<68}", "REMARK", num, text))?;
    }

    for het in &heterogens {
        put(
            writer,
            &format!(
                "{:<6} {:>3}  {:1}{:>4}{:1}  {:>5}     {:<40}",
                "HET",
                het.res_name,
                het.chain_id,
                het.res_num.unwrap_or(0),
                "",
                het.atom_count,
                ""
            ),
        )?;
    }

    let mut named: Vec<&str> = Vec::new();
    for het in &heterogens {
        if named.contains(&het.res_name.as_str()) {
            continue;
        }
        named.push(&het.res_name);
        put(
            writer,
            &format!(
                "{:<6}  {:>2} {:>3} {:<55}",
                "HETNAM",
                "",
                het.res_name,
                elements::chemical_name(&het.res_name)
            ),
        )?;
    }

    let mut formulated: Vec<&str> = Vec::new();
    for (comp_num, het) in heterogens.iter().enumerate() {
        if formulated.contains(&het.res_name.as_str()) {
            continue;
        }
        formulated.push(&het.res_name);
        put(
            writer,
            &format!(
                "{:<6}  {:>2}  {:>3} {:>2}{:1}{:<51}",
                "FORMUL",
                comp_num + 1,
                het.res_name,
                "",
                "",
                het.formula()
            ),
        )?;
    }

    let model_records = models.iter().any(|m| m.number.is_some());
    let mut counts = RecordCounts::default();
    for &i in &indices {
        let model = &models[i];
        if model_records {
            let number = model.number.unwrap_or(i as isize + 1);
            put(writer, &format!("MODEL     {number:>4}"))?;
        }
        write_model(writer, model, &serial_numbers(model), &mut counts)?;
        if model_records {
            put(writer, "ENDMDL")?;
        }
        debug!(model = ?model.number, "Wrote coordinate records.");
    }

    let first = &models[indices[0]];
    write_conect(writer, first, &serial_numbers(first), &mut counts)?;

    let mut master = String::from("MASTER    ");
    for field in [
        REMARKS.len(),
        0,
        heterogens.len(),
        0,
        0,
        0,
        0,
        0,
        counts.coord,
        counts.ter,
        counts.conect,
        0,
    ] {
        master.push_str(&format!("{field:>5}"));
    }
    put(writer, &master)?;
    put(writer, "END")?;

    info!(
        models = indices.len(),
        atoms = counts.coord,
        conect = counts.conect,
        "Wrote PDB structure."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::LoadOptions;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::StructureFile;
    use crate::core::models::atom::AtomRecord;
    use nalgebra::Point3;
    use std::io::Cursor;

    fn render(ensemble: &Ensemble, model_num: Option<isize>) -> Result<String, PdbError> {
        let mut out = Vec::new();
        PdbFile::write_to(ensemble, model_num, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn records<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
        text.lines()
            .filter(|l| l.split_whitespace().next() == Some(name))
            .map(str::trim_end)
            .collect()
    }

    fn hetatm(name: &str, element: &str, x: f64) -> AtomRecord {
        AtomRecord::new(name, Point3::new(x, 0.0, 0.0))
            .with_element(element)
            .with_record(RecordKind::Hetatm)
            .with_residue(1, "TNS")
    }

    fn tensor_ensemble() -> Ensemble {
        let mut ensemble = Ensemble::new();
        ensemble.add_model(Some(1), None).unwrap();
        ensemble.add_model(Some(2), None).unwrap();
        ensemble.add_molecule(None, "tensor").unwrap();
        ensemble.add_atom("tensor", hetatm("C", "C", 0.0)).unwrap();
        ensemble.add_atom("tensor", hetatm("X", "N", 1.0)).unwrap();
        ensemble.add_atom("tensor", hetatm("Y", "N", 2.0)).unwrap();
        ensemble.connect_atom("tensor", 0, 1).unwrap();
        ensemble.connect_atom("tensor", 0, 2).unwrap();
        ensemble
    }

    fn peptide_with_ligand() -> Ensemble {
        let mut ensemble = Ensemble::new();
        let residue = |name: &str, element: &str, x: f64| {
            AtomRecord::new(name, Point3::new(x, 1.0, -2.5))
                .with_element(element)
                .with_record(RecordKind::Atom)
                .with_residue(5, "ALA")
                .with_chain("A")
        };
        ensemble.add_atom("pep", residue("N", "N", 0.0)).unwrap();
        ensemble.add_atom("pep", residue("CA", "C", 1.458)).unwrap();
        ensemble
            .add_atom(
                "pep",
                AtomRecord::new("C1", Point3::new(9.0, 9.0, 9.0))
                    .with_element("C")
                    .with_record(RecordKind::Hetatm)
                    .with_residue(101, "LIG"),
            )
            .unwrap();
        ensemble.connect_atom("pep", 0, 1).unwrap();
        ensemble
    }

    mod heterogens {
        use super::*;

        #[test]
        fn heterogen_in_two_models_is_described_once() {
            let text = render(&tensor_ensemble(), None).unwrap();

            assert_eq!(records(&text, "HET").len(), 1);
            assert_eq!(records(&text, "HETNAM").len(), 1);
            assert_eq!(records(&text, "FORMUL").len(), 1);
            assert_eq!(records(&text, "HET")[0], "HET    TNS      1       3");
            assert_eq!(records(&text, "HETNAM")[0], "HETNAM     TNS Tensor");
            assert_eq!(records(&text, "FORMUL")[0], "FORMUL   1  TNS    C1N2");
        }

        #[test]
        fn changed_atom_count_in_second_model_is_a_mismatch() {
            let mut ensemble = tensor_ensemble();
            let second = ensemble.get_molecule_mut("tensor", Some(2)).unwrap().unwrap();
            second.add_atom(hetatm("Z", "N", 3.0));

            let err = render(&ensemble, None).unwrap_err();
            assert!(matches!(
                err,
                PdbError::HeterogenMismatch { res_num: Some(1), ref res_name, .. } if res_name == "TNS"
            ));
        }

        #[test]
        fn waters_and_standard_residues_are_not_heterogens() {
            let mut ensemble = peptide_with_ligand();
            ensemble
                .add_atom(
                    "pep",
                    AtomRecord::new("O", Point3::origin())
                        .with_element("O")
                        .with_record(RecordKind::Hetatm)
                        .with_residue(200, "HOH"),
                )
                .unwrap();

            let hets = ensemble.models()[0].heterogens().unwrap();
            assert_eq!(hets.len(), 1);
            assert_eq!(hets[0].res_name, "LIG");
            assert_eq!(hets[0].element_counts, vec![("C".to_string(), 1)]);
        }

        #[test]
        fn same_residue_number_with_different_content_across_molecules_fails() {
            let mut ensemble = Ensemble::new();
            ensemble.add_atom("a", hetatm("C", "C", 0.0)).unwrap();
            ensemble.add_atom("b", hetatm("C", "C", 0.0)).unwrap();
            ensemble.add_atom("b", hetatm("O", "O", 1.0)).unwrap();

            assert!(matches!(
                ensemble.models()[0].heterogens(),
                Err(PdbError::HeterogenMismatch { .. })
            ));
        }

        #[test]
        fn missing_element_counts_as_unknown() {
            let mut ensemble = Ensemble::new();
            let mut atom = hetatm("Q", "C", 0.0);
            atom.element = None;
            ensemble.add_atom("m", atom).unwrap();
            assert_eq!(ensemble.models()[0].heterogens().unwrap()[0].formula(), "X1");
        }
    }

    mod coordinates {
        use super::*;

        #[test]
        fn unnumbered_atoms_are_numbered_sequentially() {
            let text = render(&peptide_with_ligand(), None).unwrap();

            let atoms = records(&text, "ATOM");
            assert_eq!(
                atoms[0],
                "ATOM      1  N   ALA A   5       0.000   1.000  -2.500  1.00  0.00           N"
            );
            assert_eq!(
                atoms[1],
                "ATOM      2 CA   ALA A   5       1.458   1.000  -2.500  1.00  0.00           C"
            );
            assert_eq!(records(&text, "TER"), vec!["TER       3      ALA A   5"]);
            assert!(records(&text, "HETATM")[0].starts_with("HETATM    4 C1   LIG   101"));
            assert!(records(&text, "MODEL").is_empty());
        }

        #[test]
        fn stored_atom_numbers_are_written_and_used_by_conect() {
            let mut ensemble = Ensemble::new();
            for (name, element, number, x) in [("N", "N", 100, 0.0), ("CA", "C", 200, 1.458)] {
                ensemble
                    .add_atom(
                        "pep",
                        AtomRecord::new(name, Point3::new(x, 0.0, 0.0))
                            .with_number(number)
                            .with_element(element)
                            .with_record(RecordKind::Atom)
                            .with_residue(1, "GLY"),
                    )
                    .unwrap();
            }
            ensemble.connect_atom("pep", 0, 1).unwrap();

            let text = render(&ensemble, None).unwrap();
            let atoms = records(&text, "ATOM");
            assert!(atoms[0].starts_with("ATOM    100  N   GLY"));
            assert!(atoms[1].starts_with("ATOM    200 CA   GLY"));
            assert_eq!(records(&text, "TER"), vec!["TER     201      GLY     1"]);
            assert_eq!(
                records(&text, "CONECT"),
                vec!["CONECT  100  200", "CONECT  200  100"]
            );
        }

        #[test]
        fn missing_atom_numbers_continue_from_the_previous_serial() {
            let mut ensemble = peptide_with_ligand();
            let mol = ensemble.get_molecule_mut("pep", None).unwrap().unwrap();
            mol.atom_num[0] = Some(10);

            let text = render(&ensemble, None).unwrap();
            assert!(records(&text, "ATOM")[1].starts_with("ATOM     11 CA"));
            assert_eq!(records(&text, "TER"), vec!["TER      12      ALA A   5"]);
            assert!(records(&text, "HETATM")[0].starts_with("HETATM   13 C1"));
            assert_eq!(records(&text, "CONECT"), vec!["CONECT   10   11", "CONECT   11   10"]);
        }

        #[test]
        fn every_line_is_padded_to_eighty_columns() {
            let text = render(&peptide_with_ligand(), None).unwrap();
            assert!(text.lines().all(|l| l.len() == 80));
        }

        #[test]
        fn conect_and_master_records_follow_coordinates() {
            let text = render(&peptide_with_ligand(), None).unwrap();

            assert_eq!(records(&text, "CONECT"), vec!["CONECT    1    2", "CONECT    2    1"]);
            assert_eq!(
                records(&text, "MASTER"),
                vec!["MASTER        2    0    1    0    0    0    0    0    3    1    2    0"]
            );
            assert_eq!(text.lines().last().map(str::trim_end), Some("END"));
        }

        #[test]
        fn more_than_four_partners_continue_on_a_new_line() {
            let mut ensemble = Ensemble::new();
            for i in 0..6 {
                ensemble
                    .add_atom("hub", AtomRecord::new("C", Point3::new(i as f64, 0.0, 0.0)))
                    .unwrap();
            }
            for j in 1..6 {
                ensemble.connect_atom("hub", 0, j).unwrap();
            }

            let text = render(&ensemble, None).unwrap();
            let conect = records(&text, "CONECT");
            assert_eq!(conect[0], "CONECT    1    2    3    4    5");
            assert_eq!(conect[1], "CONECT    1    6");
        }

        #[test]
        fn model_records_wrap_each_model() {
            let text = render(&tensor_ensemble(), None).unwrap();
            assert_eq!(records(&text, "MODEL"), vec!["MODEL        1", "MODEL        2"]);
            assert_eq!(records(&text, "ENDMDL").len(), 2);
            assert_eq!(records(&text, "HETATM").len(), 6);
            assert_eq!(records(&text, "CONECT").len(), 3);
        }

        #[test]
        fn model_filter_writes_one_model() {
            let text = render(&tensor_ensemble(), Some(2)).unwrap();
            assert_eq!(records(&text, "MODEL"), vec!["MODEL        2"]);
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn empty_ensemble_is_rejected() {
            assert!(matches!(
                render(&Ensemble::new(), None),
                Err(PdbError::Structure(StructureError::NoStructureLoaded))
            ));
        }

        #[test]
        fn unknown_model_is_rejected() {
            assert!(matches!(
                render(&tensor_ensemble(), Some(7)),
                Err(PdbError::Structure(StructureError::ModelNotFound(Some(7))))
            ));
        }

        #[test]
        fn uneven_arrays_are_rejected() {
            let mut ensemble = peptide_with_ligand();
            let mol = ensemble.get_molecule_mut("pep", None).unwrap().unwrap();
            mol.element.pop();

            assert!(matches!(
                render(&ensemble, None),
                Err(PdbError::Structure(StructureError::InvalidArrayLengths { .. }))
            ));
        }
    }

    #[test]
    fn written_file_reads_back_with_bonds() {
        let original = tensor_ensemble();
        let text = render(&original, None).unwrap();

        let reread = PdbFile::read_from(&mut Cursor::new(text.as_bytes()), &LoadOptions::default()).unwrap();
        assert_eq!(reread.model_numbers(), vec![Some(1), Some(2)]);

        for (a, b) in original.models().iter().zip(reread.models()) {
            let (a, b) = (&a.molecules[0], &b.molecules[0]);
            assert_eq!(a.len(), b.len());
            for i in 0..a.len() {
                assert_eq!(a.atom_name[i], b.atom_name[i]);
                assert_eq!(a.element[i], b.element[i]);
                assert_eq!(a.res_name[i], b.res_name[i]);
                assert_eq!(a.res_num[i], b.res_num[i]);
                assert_eq!(a.position(i), b.position(i));
                assert_eq!(a.bonded(i), b.bonded(i));
            }
        }
    }
}
