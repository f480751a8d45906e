use super::{load_ensemble, open_output};
use crate::cli::AtomsArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use molstore::core::selection::{Selection, SelectionParseError};
use molstore::query::atom_loop::{AtomFields, AtomLoopOptions};
use molstore::query::export::write_atom_table;
use tracing::info;

pub fn run(args: AtomsArgs) -> Result<()> {
    let selection: Selection = args
        .select
        .parse()
        .map_err(|e: SelectionParseError| CliError::Argument(e.to_string()))?;
    let config = PartialConfig::resolve(&args.load)?;
    let ensemble = load_ensemble(&config)?;

    let options = AtomLoopOptions {
        model_num: args.model,
        average: args.average,
        fields: AtomFields::ALL,
    };
    let atoms = ensemble.atom_loop(&selection, options)?;
    let rows = write_atom_table(atoms, open_output(args.output.as_deref())?)?;

    info!(rows, average = args.average, "Exported atom table.");
    Ok(())
}
