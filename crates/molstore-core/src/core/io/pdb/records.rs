//! Fixed-column decoding of individual PDB records.
//!
//! Every field is whitespace-trimmed and a blank field decodes to `None`, so "not given" stays
//! distinguishable from "given as zero". Numeric fields are only parsed when non-blank.

use super::{PdbError, PdbParseErrorKind};
use crate::core::models::atom::RecordKind;

/// A line of input paired with its 1-based line number.
pub type NumberedLine<'a> = (usize, &'a str);

#[derive(Debug, Clone, PartialEq)]
pub struct AtomLine {
    pub kind: RecordKind,
    pub serial: Option<isize>,
    pub name: Option<String>,
    pub alt_loc: Option<char>,
    pub res_name: Option<String>,
    pub chain_id: Option<String>,
    pub res_seq: Option<isize>,
    pub icode: Option<char>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub occupancy: Option<f64>,
    pub temp_factor: Option<f64>,
    pub segment_id: Option<String>,
    pub element: Option<String>,
    pub charge: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerLine {
    pub serial: Option<isize>,
    pub res_name: Option<String>,
    pub chain_id: Option<String>,
    pub res_seq: Option<isize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConectLine {
    pub serial: Option<isize>,
    pub bonded: Vec<isize>,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn text(line: &str, start: usize, end: usize) -> Option<String> {
    let value = slice_and_trim(line, start, end);
    (!value.is_empty()).then(|| value.to_string())
}

fn character(line: &str, column: usize) -> Option<char> {
    slice_and_trim(line, column, column + 1).chars().next()
}

fn columns(start: usize, end: usize) -> String {
    format!("{}-{}", start + 1, end)
}

fn int(line: &str, line_num: usize, start: usize, end: usize) -> Result<Option<isize>, PdbError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: columns(start, end),
            value: value.into(),
        },
    })
}

fn float(line: &str, line_num: usize, start: usize, end: usize) -> Result<Option<f64>, PdbError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns(start, end),
            value: value.into(),
        },
    })
}

/// The trimmed record name in columns 1-6.
pub fn record_name(line: &str) -> &str {
    slice_and_trim(line, 0, 6)
}

pub fn parse_atom(line: &str, line_num: usize, kind: RecordKind) -> Result<AtomLine, PdbError> {
    Ok(AtomLine {
        kind,
        serial: int(line, line_num, 6, 11)?,
        name: text(line, 12, 16),
        alt_loc: character(line, 16),
        res_name: text(line, 17, 20),
        chain_id: text(line, 21, 22),
        res_seq: int(line, line_num, 22, 26)?,
        icode: character(line, 26),
        x: float(line, line_num, 30, 38)?,
        y: float(line, line_num, 38, 46)?,
        z: float(line, line_num, 46, 54)?,
        occupancy: float(line, line_num, 54, 60)?,
        temp_factor: float(line, line_num, 60, 66)?,
        segment_id: text(line, 72, 76),
        element: text(line, 76, 78),
        charge: text(line, 78, 80),
    })
}

pub fn parse_ter(line: &str, line_num: usize) -> Result<TerLine, PdbError> {
    Ok(TerLine {
        serial: int(line, line_num, 6, 11)?,
        res_name: text(line, 17, 20),
        chain_id: text(line, 21, 22),
        res_seq: int(line, line_num, 22, 26)?,
    })
}

pub fn parse_conect(line: &str, line_num: usize) -> Result<ConectLine, PdbError> {
    let serial = int(line, line_num, 6, 11)?;
    let mut bonded = Vec::with_capacity(4);
    for start in [11, 16, 21, 26] {
        if let Some(partner) = int(line, line_num, start, start + 5)? {
            bonded.push(partner);
        }
    }
    Ok(ConectLine { serial, bonded })
}

/// Reads the model number, the second whitespace-separated token of a MODEL record.
pub fn parse_model_number(line: &str, line_num: usize) -> Result<isize, PdbError> {
    line.split_whitespace()
        .nth(1)
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| PdbError::CorruptModelRecord {
            line: line_num,
            record: line.trim_end().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM: &str =
        "ATOM      2  CA  GLY A   1      11.104   6.134  -6.504  1.00  0.00      SEG1 C  ";
    const HETATM: &str =
        "HETATM 1234 FE   HEM B 201A     -1.500  12.250   0.001  0.50 15.20          FE2+";

    #[test]
    fn record_name_handles_short_lines() {
        assert_eq!(record_name(ATOM), "ATOM");
        assert_eq!(record_name(HETATM), "HETATM");
        assert_eq!(record_name("END"), "END");
        assert_eq!(record_name(""), "");
    }

    #[test]
    fn atom_fields_are_decoded_by_column() {
        let atom = parse_atom(ATOM, 1, RecordKind::Atom).unwrap();
        assert_eq!(atom.serial, Some(2));
        assert_eq!(atom.name.as_deref(), Some("CA"));
        assert_eq!(atom.alt_loc, None);
        assert_eq!(atom.res_name.as_deref(), Some("GLY"));
        assert_eq!(atom.chain_id.as_deref(), Some("A"));
        assert_eq!(atom.res_seq, Some(1));
        assert_eq!(atom.icode, None);
        assert_eq!(atom.x, Some(11.104));
        assert_eq!(atom.y, Some(6.134));
        assert_eq!(atom.z, Some(-6.504));
        assert_eq!(atom.occupancy, Some(1.0));
        assert_eq!(atom.temp_factor, Some(0.0));
        assert_eq!(atom.segment_id.as_deref(), Some("SEG1"));
        assert_eq!(atom.element.as_deref(), Some("C"));
        assert_eq!(atom.charge, None);
    }

    #[test]
    fn hetatm_fields_include_insertion_code_and_charge() {
        let atom = parse_atom(HETATM, 1, RecordKind::Hetatm).unwrap();
        assert_eq!(atom.kind, RecordKind::Hetatm);
        assert_eq!(atom.serial, Some(1234));
        assert_eq!(atom.name.as_deref(), Some("FE"));
        assert_eq!(atom.res_seq, Some(201));
        assert_eq!(atom.icode, Some('A'));
        assert_eq!(atom.occupancy, Some(0.5));
        assert_eq!(atom.temp_factor, Some(15.2));
        assert_eq!(atom.segment_id, None);
        assert_eq!(atom.element.as_deref(), Some("FE"));
        assert_eq!(atom.charge.as_deref(), Some("2+"));
    }

    #[test]
    fn blank_fields_are_absent_not_zero() {
        let line = "ATOM      1  N   ALA     1       0.000                                     ";
        let atom = parse_atom(line, 1, RecordKind::Atom).unwrap();
        assert_eq!(atom.chain_id, None);
        assert_eq!(atom.x, Some(0.0));
        assert_eq!(atom.y, None);
        assert_eq!(atom.z, None);
        assert_eq!(atom.occupancy, None);
        assert_eq!(atom.element, None);
    }

    #[test]
    fn alt_loc_is_decoded() {
        let line = "ATOM      3  CB AALA A   2       1.000   2.000   3.000  0.60  0.00           C";
        let atom = parse_atom(line, 1, RecordKind::Atom).unwrap();
        assert_eq!(atom.alt_loc, Some('A'));
        assert_eq!(atom.res_name.as_deref(), Some("ALA"));
    }

    #[test]
    fn invalid_numbers_report_line_and_columns() {
        let line = "ATOM      1  N   ALA A   1       abc     2.000   3.000";
        match parse_atom(line, 7, RecordKind::Atom) {
            Err(PdbError::Parse {
                line: 7,
                kind: PdbParseErrorKind::InvalidFloat { columns, value },
            }) => {
                assert_eq!(columns, "31-38");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn ter_fields_are_decoded() {
        let ter = parse_ter("TER       3      GLY A   1", 4).unwrap();
        assert_eq!(ter.serial, Some(3));
        assert_eq!(ter.res_name.as_deref(), Some("GLY"));
        assert_eq!(ter.chain_id.as_deref(), Some("A"));
        assert_eq!(ter.res_seq, Some(1));
    }

    #[test]
    fn conect_collects_up_to_four_partners() {
        let conect = parse_conect("CONECT    1    2    3    4    5", 1).unwrap();
        assert_eq!(conect.serial, Some(1));
        assert_eq!(conect.bonded, vec![2, 3, 4, 5]);

        let short = parse_conect("CONECT   10   11", 2).unwrap();
        assert_eq!(short.serial, Some(10));
        assert_eq!(short.bonded, vec![11]);
    }

    #[test]
    fn model_number_is_second_token() {
        assert_eq!(parse_model_number("MODEL        2", 1).unwrap(), 2);
        assert!(matches!(
            parse_model_number("MODEL     x", 9),
            Err(PdbError::CorruptModelRecord { line: 9, .. })
        ));
        assert!(matches!(
            parse_model_number("MODEL", 1),
            Err(PdbError::CorruptModelRecord { .. })
        ));
    }
}
