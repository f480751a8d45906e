use phf::{Map, Set, phf_map, phf_set};
use tracing::warn;

static AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
};

static ONE_LETTER_CODES: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
};

// Amino acid atom names with numbering removed.
static AMINO_ACID_ATOM_ELEMENTS: Map<&'static str, &'static str> = phf_map! {
    "CA" => "C", "CB" => "C", "CG" => "C", "CD" => "C", "CE" => "C", "CH" => "C", "CZ" => "C",
    "ND" => "N", "NE" => "N", "NH" => "N", "NZ" => "N",
    "HA" => "H", "HB" => "H", "HG" => "H", "HD" => "H", "HE" => "H", "HH" => "H", "HT" => "H", "HZ" => "H",
    "OG" => "O", "OD" => "O", "OE" => "O", "OH" => "O", "OT" => "O",
    "SD" => "S", "SG" => "S",
};

static INFERABLE_ELEMENTS: Set<&'static str> = phf_set! {
    "H", "C", "N", "O", "F", "P", "S",
};

static VALENCE_LIMITS: Map<&'static str, usize> = phf_map! {
    "H" => 1,
    "O" => 2,
    "N" => 3,
    "C" => 4,
};

static CHEMICAL_NAMES: Map<&'static str, &'static str> = phf_map! {
    "TNS" => "Tensor",
    "COM" => "Centre of mass",
    "AXS" => "Tensor axes",
    "SIM" => "Monte Carlo simulation tensor axes",
    "PIV" => "Pivot point",
    "CON" => "Cone",
    "AVE" => "Average vector",
};

pub const UNLIMITED_VALENCE: usize = 1000;
pub const UNKNOWN_CHEMICAL_NAME: &str = "Unknown";

pub fn is_amino_acid(res_name: &str) -> bool {
    AMINO_ACIDS.contains(res_name.trim())
}

pub fn one_letter_code(res_name: &str) -> Option<char> {
    ONE_LETTER_CODES.get(res_name.trim()).copied()
}

/// Maximum number of covalent partners the geometric search gives an atom of `element`.
pub fn max_connections(element: Option<&str>) -> usize {
    element
        .and_then(|e| VALENCE_LIMITS.get(e))
        .copied()
        .unwrap_or(UNLIMITED_VALENCE)
}

pub fn chemical_name(res_name: &str) -> &'static str {
    CHEMICAL_NAMES
        .get(res_name)
        .copied()
        .unwrap_or(UNKNOWN_CHEMICAL_NAME)
}

/// Derives an element symbol from a PDB atom name.
///
/// Quotes and any leading or trailing digits are stripped, amino acid atom names are mapped to
/// their element, and only H, C, N, O, F, P and S are accepted. Anything else logs a warning and
/// returns `None`.
pub fn infer_element(atom_name: &str) -> Option<&'static str> {
    let stripped = atom_name
        .trim()
        .trim_matches('\'')
        .trim_matches(|c: char| c.is_ascii_digit());

    let candidate = AMINO_ACID_ATOM_ELEMENTS
        .get(stripped)
        .copied()
        .unwrap_or(stripped);

    match INFERABLE_ELEMENTS.get_key(candidate) {
        Some(element) => Some(*element),
        None => {
            warn!(atom = atom_name, "Cannot determine the element associated with atom.");
            None
        }
    }
}
