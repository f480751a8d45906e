//! Atom and molecule selections.
//!
//! A selection string names molecules, residues and atoms with the `#mol:res@atom` syntax. Every
//! part is optional, but they must appear in that order. Each part is a comma separated list of
//! names (with `*` wildcards), numbers, or inclusive number ranges such as `5-9`. Two selections may
//! be combined with `&` (intersection) or `|` (union); the rightmost operator binds last.
//!
//! ```ignore
//! let sel: Selection = "#protein:10-20@CA,N".parse()?;
//! let heavy_ligand: Selection = "#lig@C* | #lig@O*".parse()?;
//! ```

use std::str::FromStr;
use thiserror::Error;

/// The matching contract used by queries and transforms to restrict the atoms they visit.
pub trait SelectionMatcher {
    fn matches_molecule(&self, mol_name: &str) -> bool;

    fn matches_atom(
        &self,
        atom_num: Option<isize>,
        atom_name: Option<&str>,
        res_num: Option<isize>,
        res_name: Option<&str>,
        mol_name: &str,
    ) -> bool;
}

/// Matches every molecule and atom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllAtoms;

impl SelectionMatcher for AllAtoms {
    fn matches_molecule(&self, _mol_name: &str) -> bool {
        true
    }

    fn matches_atom(
        &self,
        _atom_num: Option<isize>,
        _atom_name: Option<&str>,
        _res_num: Option<isize>,
        _res_name: Option<&str>,
        _mol_name: &str,
    ) -> bool {
        true
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionParseError {
    #[error("Selection '{0}' must start with '#', ':' or '@'")]
    MissingPrefix(String),
    #[error("Selection '{0}' has its parts out of order or repeated; expected '#mol:res@atom'")]
    InvalidOrder(String),
    #[error("Selection '{0}' has an empty part")]
    EmptyPart(String),
    #[error("Invalid number range '{0}'")]
    InvalidRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionItem {
    Name(String),
    Number(isize),
    Range(isize, isize),
}

impl SelectionItem {
    fn matches(&self, number: Option<isize>, name: Option<&str>) -> bool {
        match self {
            SelectionItem::Name(pattern) => name.is_some_and(|n| wildcard_match(pattern, n)),
            SelectionItem::Number(n) => number == Some(*n),
            SelectionItem::Range(start, end) => number.is_some_and(|n| (*start..=*end).contains(&n)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Empty lists match everything at that level.
    Simple {
        molecules: Vec<SelectionItem>,
        residues: Vec<SelectionItem>,
        atoms: Vec<SelectionItem>,
    },
    Union(Box<Selection>, Box<Selection>),
    Intersection(Box<Selection>, Box<Selection>),
}

impl Selection {
    /// A selection matching everything.
    pub fn all() -> Self {
        Selection::Simple {
            molecules: Vec::new(),
            residues: Vec::new(),
            atoms: Vec::new(),
        }
    }

    fn matches_residue(&self, res_num: Option<isize>, res_name: Option<&str>, mol_name: &str) -> bool {
        match self {
            Selection::Simple { residues, .. } => {
                self.matches_molecule(mol_name)
                    && (residues.is_empty() || residues.iter().any(|r| r.matches(res_num, res_name)))
            }
            Selection::Union(a, b) => {
                a.matches_residue(res_num, res_name, mol_name)
                    || b.matches_residue(res_num, res_name, mol_name)
            }
            Selection::Intersection(a, b) => {
                a.matches_residue(res_num, res_name, mol_name)
                    && b.matches_residue(res_num, res_name, mol_name)
            }
        }
    }
}

impl SelectionMatcher for Selection {
    fn matches_molecule(&self, mol_name: &str) -> bool {
        match self {
            Selection::Simple { molecules, .. } => {
                molecules.is_empty() || molecules.iter().any(|m| m.matches(None, Some(mol_name)))
            }
            Selection::Union(a, b) => a.matches_molecule(mol_name) || b.matches_molecule(mol_name),
            Selection::Intersection(a, b) => {
                a.matches_molecule(mol_name) && b.matches_molecule(mol_name)
            }
        }
    }

    fn matches_atom(
        &self,
        atom_num: Option<isize>,
        atom_name: Option<&str>,
        res_num: Option<isize>,
        res_name: Option<&str>,
        mol_name: &str,
    ) -> bool {
        match self {
            Selection::Simple { atoms, .. } => {
                self.matches_residue(res_num, res_name, mol_name)
                    && (atoms.is_empty() || atoms.iter().any(|a| a.matches(atom_num, atom_name)))
            }
            Selection::Union(a, b) => {
                a.matches_atom(atom_num, atom_name, res_num, res_name, mol_name)
                    || b.matches_atom(atom_num, atom_name, res_num, res_name, mol_name)
            }
            Selection::Intersection(a, b) => {
                a.matches_atom(atom_num, atom_name, res_num, res_name, mol_name)
                    && b.matches_atom(atom_num, atom_name, res_num, res_name, mol_name)
            }
        }
    }
}

impl FromStr for Selection {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Selection::all());
        }

        let and_index = s.rfind('&');
        let or_index = s.rfind('|');
        match (and_index, or_index) {
            (Some(a), o) if o.is_none_or(|o| a > o) => Ok(Selection::Intersection(
                Box::new(s[..a].parse()?),
                Box::new(s[a + 1..].parse()?),
            )),
            (_, Some(o)) => Ok(Selection::Union(
                Box::new(s[..o].parse()?),
                Box::new(s[o + 1..].parse()?),
            )),
            _ => parse_simple(s),
        }
    }
}

fn parse_simple(s: &str) -> Result<Selection, SelectionParseError> {
    const MARKERS: [char; 3] = ['#', ':', '@'];

    if !s.starts_with(MARKERS) {
        return Err(SelectionParseError::MissingPrefix(s.to_string()));
    }

    let mut parts: [Option<&str>; 3] = [None, None, None];
    let mut last_level = None;
    let mut rest = s;
    while let Some(marker) = rest.chars().next() {
        let level = MARKERS
            .iter()
            .position(|&m| m == marker)
            .ok_or_else(|| SelectionParseError::InvalidOrder(s.to_string()))?;
        if last_level.is_some_and(|last| level <= last) {
            return Err(SelectionParseError::InvalidOrder(s.to_string()));
        }
        last_level = Some(level);

        let body = &rest[1..];
        let end = body.find(MARKERS).unwrap_or(body.len());
        let token = body[..end].trim();
        if token.is_empty() {
            return Err(SelectionParseError::EmptyPart(s.to_string()));
        }
        parts[level] = Some(token);
        rest = &body[end..];
    }

    let [molecules, residues, atoms] = parts.map(|p| p.map(parse_items).transpose());
    Ok(Selection::Simple {
        molecules: molecules?.unwrap_or_default(),
        residues: residues?.unwrap_or_default(),
        atoms: atoms?.unwrap_or_default(),
    })
}

fn parse_items(token: &str) -> Result<Vec<SelectionItem>, SelectionParseError> {
    token
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_item)
        .collect()
}

fn parse_item(item: &str) -> Result<SelectionItem, SelectionParseError> {
    if let Ok(n) = item.parse::<isize>() {
        return Ok(SelectionItem::Number(n));
    }

    let digits_or_dash = |c: char| c.is_ascii_digit() || c == '-';
    if let Some((start, end)) = item.get(1..).and_then(|tail| tail.find('-')).map(|i| item.split_at(i + 1)) {
        if item.chars().all(digits_or_dash) {
            let start: isize = start
                .parse()
                .map_err(|_| SelectionParseError::InvalidRange(item.to_string()))?;
            let end: isize = end[1..]
                .parse()
                .map_err(|_| SelectionParseError::InvalidRange(item.to_string()))?;
            if start > end {
                return Err(SelectionParseError::InvalidRange(item.to_string()));
            }
            return Ok(SelectionItem::Range(start, end));
        }
    }

    Ok(SelectionItem::Name(item.to_string()))
}

/// Whole-string match where `*` stands for any (possibly empty) run of characters.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}
