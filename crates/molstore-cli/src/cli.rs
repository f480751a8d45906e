use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use nalgebra::Vector3;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "molstore CLI - Load, inspect, query and rewrite molecular structures stored in PDB and XYZ files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the models, molecules, sequences and heterogens of a structure.
    Info(InfoArgs),
    /// Rewrite a structure as PDB or XYZ, optionally inferring bonds or moving atoms first.
    Convert(ConvertArgs),
    /// Export selected atoms as a CSV table.
    Atoms(AtomsArgs),
    /// Print the bond vectors from base atoms to an attached atom.
    Vectors(VectorsArgs),
}

/// Options shared by every command that loads a structure.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Path to the input structure file (.pdb, .ent or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep only this PDB alternate location, overriding the config file.
    #[arg(long, value_name = "CHAR")]
    pub alt_loc: Option<char>,

    /// Load only these models (comma separated numbers).
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub read_model: Option<Vec<isize>>,

    /// Load only these molecules of each model (comma separated 1-based numbers).
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub read_mol: Option<Vec<usize>>,

    /// Override the geometric search radius used when inferring every bond, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub search_radius: Option<f64>,

    /// Override the radius bond lookups use for atoms left unbonded by the residue templates, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub fallback_radius: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S connectivity.search-radius=1.4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub load: LoadArgs,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Path for the output structure file. The extension selects the format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Write only the model with this number.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true, conflicts_with = "mean")]
    pub model: Option<isize>,

    /// Infer covalent connectivity before writing, so CONECT records are produced.
    #[arg(long)]
    pub connect: bool,

    /// Replace all models by a single model holding the mean atom positions.
    #[arg(long)]
    pub mean: bool,

    /// Translate every atom by this vector before writing. Example: --translate=-1.5,0,2
    #[arg(long, value_name = "X,Y,Z", value_parser = parser::parse_vector, allow_hyphen_values = true)]
    pub translate: Option<Vector3<f64>>,
}

/// Arguments for the `atoms` subcommand.
#[derive(Args, Debug)]
pub struct AtomsArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Atom selection in '#mol:res@atom' syntax. Everything is selected by default.
    #[arg(short, long, default_value = "", value_name = "SELECTION")]
    pub select: String,

    /// Visit only the model with this number.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
    pub model: Option<isize>,

    /// Report each atom once, with its position averaged over the visited models.
    #[arg(long)]
    pub average: bool,

    /// Write the table to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `vectors` subcommand.
#[derive(Args, Debug)]
pub struct VectorsArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Name pattern of the attached atom, or a '#mol:res@atom' selection.
    #[arg(short, long, required = true, value_name = "PATTERN")]
    pub attached: String,

    /// Only consider this molecule.
    #[arg(long = "mol", value_name = "NAME")]
    pub mol_name: Option<String>,

    /// Residue number of the base atom.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub res_num: Option<isize>,

    /// Residue name of the base atom.
    #[arg(long, value_name = "NAME")]
    pub res_name: Option<String>,

    /// Serial number of the base atom.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub atom_num: Option<isize>,

    /// Name of the base atom.
    #[arg(long, value_name = "NAME")]
    pub atom_name: Option<String>,

    /// Visit only the model with this number.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
    pub model: Option<isize>,
}
