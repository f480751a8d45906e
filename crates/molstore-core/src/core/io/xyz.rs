//! XYZ coordinate files.
//!
//! An XYZ file is a sequence of models, each one molecule: an optional atom-count line, a comment
//! line, and one `element x y z` line per atom. The count declared on the first line splits the
//! atom lines into models; without it the whole file is one model.

use crate::core::io::traits::StructureFile;
use crate::core::io::{LoadOptions, LoadedModel, LoadedMolecule};
use crate::core::models::atom::AtomRecord;
use crate::core::models::ensemble::Ensemble;
use crate::core::models::error::StructureError;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const ATOM_TOKENS: usize = 4;
const UNKNOWN_ELEMENT: &str = "X";

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("The XYZ input contains no lines")]
    EmptyInput,
    #[error("The atom count on line {line} is corrupt, cannot read the XYZ file: '{record}'")]
    CorruptModelRecord { line: usize, record: String },
    #[error("Invalid coordinate in field {field} of line {line} (value: '{value}')")]
    InvalidCoordinate {
        line: usize,
        field: usize,
        value: String,
    },
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Yields the atom lines of each model in an XYZ file, numbered from 1.
pub struct XyzModelSegmenter<'a, S> {
    lines: &'a [S],
    pos: usize,
    atoms_per_model: Option<usize>,
    number: isize,
}

impl<'a, S: AsRef<str>> XyzModelSegmenter<'a, S> {
    /// Reads the declared atom count, if the first line holds a single token.
    pub fn new(lines: &'a [S]) -> Result<Self, XyzError> {
        let atoms_per_model = match lines.first().map(|l| l.as_ref()) {
            Some(first) if first.split_whitespace().count() == 1 => {
                let count = first.trim().parse::<usize>().map_err(|_| {
                    XyzError::CorruptModelRecord {
                        line: 1,
                        record: first.trim_end().to_string(),
                    }
                })?;
                (count > 0).then_some(count)
            }
            _ => None,
        };
        Ok(Self {
            lines,
            pos: 0,
            atoms_per_model,
            number: 0,
        })
    }
}

impl<'a, S: AsRef<str>> Iterator for XyzModelSegmenter<'a, S> {
    type Item = (isize, Vec<(usize, &'a str)>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut records = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].as_ref();
            self.pos += 1;
            if line.split_whitespace().count() != ATOM_TOKENS {
                continue;
            }
            records.push((self.pos, line));
            if self.atoms_per_model == Some(records.len()) {
                break;
            }
        }

        if records.is_empty() {
            return None;
        }
        self.number += 1;
        Some((self.number, records))
    }
}

fn fill_molecule(records: &[(usize, &str)]) -> Result<Molecule, XyzError> {
    let mut mol = Molecule::default();
    for &(line_num, line) in records {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut coords = [0.0; 3];
        for (field, (coord, token)) in coords.iter_mut().zip(&tokens[1..]).enumerate() {
            *coord = token.parse().map_err(|_| XyzError::InvalidCoordinate {
                line: line_num,
                field: field + 2,
                value: token.to_string(),
            })?;
        }

        let serial = mol.len() as isize + 1;
        mol.add_atom(
            AtomRecord::new(tokens[0], Point3::from(coords))
                .with_number(serial)
                .with_element(tokens[0]),
        );
    }
    Ok(mol)
}

#[instrument(skip_all, name = "xyz_loader", fields(source = ?options.source_path))]
fn read_xyz(
    ensemble: &mut Ensemble,
    reader: &mut impl BufRead,
    options: &LoadOptions,
) -> Result<(), XyzError> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    if lines.is_empty() {
        return Err(XyzError::EmptyInput);
    }

    let mut loaded = Vec::new();
    for (number, records) in XyzModelSegmenter::new(&lines)? {
        if !options.keeps_model(Some(number)) {
            continue;
        }
        let mut molecules = Vec::new();
        if options.keeps_molecule(1) {
            molecules.push(LoadedMolecule {
                file_mol_num: 1,
                molecule: fill_molecule(&records)?,
            });
        }
        loaded.push(LoadedModel {
            number: Some(number),
            molecules,
        });
    }

    if loaded.is_empty() {
        warn!("No coordinate records could be read from the XYZ input.");
        return Ok(());
    }

    info!(models = loaded.len(), "Loaded XYZ structure.");
    ensemble.pack(loaded, options)?;
    Ok(())
}

#[instrument(skip_all, name = "xyz_writer", fields(model = ?model_num))]
fn write_xyz(
    ensemble: &Ensemble,
    model_num: Option<isize>,
    writer: &mut impl Write,
) -> Result<(), XyzError> {
    if ensemble.is_empty() {
        return Err(StructureError::NoStructureLoaded.into());
    }
    let indices = ensemble.model_indices(model_num);
    if indices.is_empty() {
        return Err(StructureError::ModelNotFound(model_num).into());
    }

    for &i in &indices {
        let model = &ensemble.models()[i];
        for mol in &model.molecules {
            mol.validate_arrays()?;
        }

        writeln!(writer, "{}", model.atom_count())?;
        writeln!(writer)?;
        for mol in &model.molecules {
            for j in 0..mol.len() {
                let element = mol.element[j]
                    .as_deref()
                    .or(mol.atom_name[j].as_deref())
                    .unwrap_or(UNKNOWN_ELEMENT);
                writeln!(
                    writer,
                    "{:<2} {:>12.6} {:>12.6} {:>12.6}",
                    element,
                    mol.x[j].unwrap_or(0.0),
                    mol.y[j].unwrap_or(0.0),
                    mol.z[j].unwrap_or(0.0)
                )?;
            }
        }
    }
    debug!(models = indices.len(), "Wrote XYZ structure.");
    Ok(())
}

pub struct XyzFile;

impl StructureFile for XyzFile {
    type Error = XyzError;

    fn read_into(
        ensemble: &mut Ensemble,
        reader: &mut impl BufRead,
        options: &LoadOptions,
    ) -> Result<(), Self::Error> {
        read_xyz(ensemble, reader, options)
    }

    fn write_to(
        ensemble: &Ensemble,
        model_num: Option<isize>,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        write_xyz(ensemble, model_num, writer)
    }
}

impl Ensemble {
    /// Loads the XYZ file at `path` into the ensemble.
    pub fn load_xyz<P: AsRef<Path>>(&mut self, path: P, options: &LoadOptions) -> Result<(), XyzError> {
        XyzFile::read_from_path(self, path, options)
    }

    /// Writes the model numbered `model_num`, or all models, as an XYZ file.
    pub fn write_xyz(&self, writer: &mut impl Write, model_num: Option<isize>) -> Result<(), XyzError> {
        XyzFile::write_to(self, model_num, writer)
    }
}
