use thiserror::Error;

/// Fatal errors raised by the structure store.
///
/// Anything that would leave the store internally inconsistent, or that asks for data the store
/// does not hold, surfaces as one of these variants. Recoverable conditions (an unresolvable bond
/// partner, an atom with no element) are logged or reported as warnings instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructureError {
    #[error("No structure has been loaded")]
    NoStructureLoaded,

    #[error("Molecule '{molecule}' has inconsistent per-atom arrays: {details}")]
    InvalidArrayLengths { molecule: String, details: String },

    #[error(
        "Atom {index} of molecule '{molecule}' differs between model {first:?} and model {other:?}"
    )]
    ModelAtomMismatch {
        molecule: String,
        index: usize,
        first: Option<isize>,
        other: Option<isize>,
    },

    #[error("Models are inconsistent: {0}")]
    InconsistentModels(String),

    #[error("Molecule '{name}' already exists in model {model:?}")]
    MoleculeExists { name: String, model: Option<isize> },

    #[error("Molecule '{0}' does not exist")]
    MoleculeNotFound(String),

    #[error("Model {0} already exists")]
    ModelExists(isize),

    #[error("Model {0:?} does not exist")]
    ModelNotFound(Option<isize>),

    #[error("The structure holds {0} models; a model number must be given")]
    ModelTargetAmbiguous(usize),

    #[error("Atom index {index} is out of range for a molecule of {len} atoms")]
    AtomIndexOutOfRange { index: usize, len: usize },

    #[error("Expected one position per model ({expected}), got {found}")]
    PositionCount { expected: usize, found: usize },

    #[error("Invalid load mapping: {0}")]
    Mapping(String),
}
