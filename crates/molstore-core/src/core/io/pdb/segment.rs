//! Splitting of PDB lines into models, and of model records into molecules.

use super::PdbError;
use super::records::{NumberedLine, parse_model_number, record_name};

/// The coordinate records of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecords<'a> {
    pub number: Option<isize>,
    pub lines: Vec<NumberedLine<'a>>,
}

/// Yields the records of each model in a PDB file.
///
/// A `MODEL` record sets the number of the following model and `ENDMDL` closes it. Records before
/// the first ATOM or HETATM of a model are skipped. A file without `MODEL` records is a single
/// model with no number.
pub struct ModelSegmenter<'a, S> {
    lines: &'a [S],
    pos: usize,
    number: Option<isize>,
}

impl<'a, S: AsRef<str>> ModelSegmenter<'a, S> {
    pub fn new(lines: &'a [S]) -> Self {
        Self {
            lines,
            pos: 0,
            number: None,
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for ModelSegmenter<'a, S> {
    type Item = Result<ModelRecords<'a>, PdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut records = Vec::new();

        while self.pos < self.lines.len() {
            let line_num = self.pos + 1;
            let line = self.lines[self.pos].as_ref();
            self.pos += 1;

            let name = record_name(line);
            if name == "MODEL" {
                match parse_model_number(line, line_num) {
                    Ok(number) => self.number = Some(number),
                    Err(e) => {
                        self.pos = self.lines.len();
                        return Some(Err(e));
                    }
                }
            }

            if records.is_empty() && !matches!(name, "ATOM" | "HETATM") {
                continue;
            }

            if name == "ENDMDL" {
                return Some(Ok(ModelRecords {
                    number: self.number,
                    lines: records,
                }));
            }

            records.push((line_num, line));
        }

        (!records.is_empty()).then(|| {
            Ok(ModelRecords {
                number: self.number,
                lines: records,
            })
        })
    }
}

/// CONECT records that sit outside every MODEL/ENDMDL bracket.
pub fn global_conect_records<S: AsRef<str>>(lines: &[S]) -> Vec<NumberedLine<'_>> {
    let mut inside_model = false;
    let mut conect = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        match record_name(line) {
            "MODEL" => inside_model = true,
            "ENDMDL" => inside_model = false,
            "CONECT" if !inside_model => conect.push((i + 1, line)),
            _ => {}
        }
    }
    conect
}

/// Yields `(molecule number, records)` for each molecule within a model.
///
/// Molecules end at `ENDMDL`, at a `TER` not immediately followed by `HETATM` or `CONECT`, and at a
/// `HETATM` immediately followed by `ATOM` (that HETATM stays with the closing molecule). `END` and
/// `MASTER` end the last molecule. CONECT records are left out: connectivity is resolved per model.
/// Molecule numbers start at 1 and advance at every boundary, and empty molecules are not yielded.
pub struct MoleculeSegmenter<'s, 'a> {
    records: &'s [NumberedLine<'a>],
    pos: usize,
    mol_num: usize,
    finished: bool,
}

impl<'s, 'a> MoleculeSegmenter<'s, 'a> {
    pub fn new(records: &'s [NumberedLine<'a>]) -> Self {
        Self {
            records,
            pos: 0,
            mol_num: 1,
            finished: false,
        }
    }
}

impl<'s, 'a> Iterator for MoleculeSegmenter<'s, 'a> {
    type Item = (usize, Vec<NumberedLine<'a>>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut group = Vec::new();
        while self.pos < self.records.len() {
            let record = self.records[self.pos];
            let next = self.records.get(self.pos + 1).map(|(_, l)| record_name(*l));
            self.pos += 1;

            let boundary = match record_name(record.1) {
                "END" | "MASTER" => {
                    self.pos = self.records.len();
                    break;
                }
                "ENDMDL" => true,
                "TER" if next.is_some_and(|n| n != "HETATM" && n != "CONECT") => true,
                "HETATM" if next == Some("ATOM") => {
                    group.push(record);
                    true
                }
                "CONECT" => false,
                _ => {
                    group.push(record);
                    false
                }
            };

            if boundary {
                let number = self.mol_num;
                self.mol_num += 1;
                if !group.is_empty() {
                    return Some((number, group));
                }
            }
        }

        self.finished = true;
        (!group.is_empty()).then_some((self.mol_num, group))
    }
}
