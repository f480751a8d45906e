use super::PdbError;
use super::records::{self, ConectLine, NumberedLine, record_name};
use super::segment::{ModelSegmenter, MoleculeSegmenter, global_conect_records};
use crate::core::io::{LoadOptions, LoadedModel, LoadedMolecule};
use crate::core::models::atom::{AtomRecord, RecordKind};
use crate::core::models::ensemble::Ensemble;
use crate::core::models::molecule::Molecule;
use crate::core::topology::elements;
use std::io::BufRead;
use tracing::{debug, info, instrument, trace, warn};

#[instrument(skip_all, name = "pdb_loader", fields(source = ?options.source_path))]
pub(super) fn read_pdb(
    ensemble: &mut Ensemble,
    reader: &mut impl BufRead,
    options: &LoadOptions,
) -> Result<(), PdbError> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    if lines.is_empty() {
        return Err(PdbError::EmptyInput);
    }

    let has_model_records = lines.iter().any(|l| record_name(l) == "MODEL");
    let global_conect = if has_model_records {
        parse_conect_lines(&global_conect_records(&lines))?
    } else {
        Vec::new()
    };

    let mut loaded = Vec::new();
    for model in ModelSegmenter::new(&lines) {
        let model = model?;
        if !options.keeps_model(model.number) {
            debug!(model = ?model.number, "Skipping model.");
            continue;
        }

        let conect: Vec<NumberedLine> = model
            .lines
            .iter()
            .filter(|(_, l)| record_name(l) == "CONECT")
            .copied()
            .collect();
        let model_conect = parse_conect_lines(&conect)?;

        let mut molecules = Vec::new();
        for (mol_num, group) in MoleculeSegmenter::new(&model.lines) {
            if !options.keeps_molecule(mol_num) {
                continue;
            }
            molecules.push(LoadedMolecule {
                file_mol_num: mol_num,
                molecule: fill_molecule(&group, options.alt_loc)?,
            });
        }

        let report_dangling = options.read_mol.is_none();
        apply_conect(
            &mut molecules,
            model_conect.iter().chain(&global_conect),
            report_dangling,
        );

        debug!(model = ?model.number, molecules = molecules.len(), "Decoded model.");
        loaded.push(LoadedModel {
            number: model.number,
            molecules,
        });
    }

    if loaded.is_empty() {
        warn!("No coordinate records could be read from the PDB input.");
        return Ok(());
    }

    info!(
        models = loaded.len(),
        molecules = loaded[0].molecules.len(),
        "Loaded PDB structure."
    );
    ensemble.pack(loaded, options)?;
    Ok(())
}

fn parse_conect_lines(lines: &[NumberedLine]) -> Result<Vec<ConectLine>, PdbError> {
    lines
        .iter()
        .map(|&(line_num, line)| records::parse_conect(line, line_num))
        .collect()
}

/// Builds one molecule from its ATOM, HETATM and TER records.
fn fill_molecule(group: &[NumberedLine], alt_loc: Option<char>) -> Result<Molecule, PdbError> {
    let mut mol = Molecule::default();

    for &(line_num, line) in group {
        let kind = match record_name(line) {
            "ATOM" => RecordKind::Atom,
            "HETATM" => RecordKind::Hetatm,
            "TER" => {
                let ter = records::parse_ter(line, line_num)?;
                trace!(line = line_num, residue = ?ter.res_name, res_num = ?ter.res_seq, "Chain terminus.");
                continue;
            }
            _ => continue,
        };

        let atom = records::parse_atom(line, line_num, kind)?;
        if let Some(location) = atom.alt_loc {
            match alt_loc {
                None => return Err(PdbError::AltLocUnspecified { line: line_num }),
                Some(selected) if selected != location => continue,
                Some(_) => {}
            }
        }

        let element = atom.element.or_else(|| {
            atom.name
                .as_deref()
                .and_then(elements::infer_element)
                .map(str::to_string)
        });

        mol.add_atom(AtomRecord {
            atom_num: atom.serial,
            atom_name: atom.name,
            element,
            record: Some(atom.kind),
            chain_id: atom.chain_id,
            segment_id: atom.segment_id,
            res_name: atom.res_name,
            res_num: atom.res_seq,
            x: atom.x,
            y: atom.y,
            z: atom.z,
        });
    }

    Ok(mol)
}

/// Applies CONECT records to every molecule in which both serials resolve.
fn apply_conect<'c>(
    molecules: &mut [LoadedMolecule],
    conect: impl Iterator<Item = &'c ConectLine>,
    report_dangling: bool,
) {
    for record in conect {
        let Some(serial) = record.serial else {
            continue;
        };
        for &partner in &record.bonded {
            let mut resolved = false;
            for loaded in molecules.iter_mut() {
                let mol = &mut loaded.molecule;
                if let (Some(i), Some(j)) = (mol.atom_index(serial), mol.atom_index(partner)) {
                    resolved |= mol.connect(i, j).is_ok();
                }
            }
            if !resolved && report_dangling {
                warn!(
                    serial,
                    partner, "CONECT record refers to atoms not present in any molecule."
                );
            }
        }
    }
}
