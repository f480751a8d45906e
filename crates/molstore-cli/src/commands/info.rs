use super::{load_ensemble, open_output};
use crate::cli::InfoArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use molstore::core::models::error::StructureError;
use std::io::Write;

pub fn run(args: InfoArgs) -> Result<()> {
    let mut out = open_output(None)?;
    report(&args, &mut out)?;
    out.flush()?;
    Ok(())
}

fn report(args: &InfoArgs, out: &mut impl Write) -> Result<()> {
    let config = PartialConfig::resolve(&args.load)?;
    let ensemble = load_ensemble(&config)?;
    let first = ensemble
        .models()
        .first()
        .ok_or(StructureError::NoStructureLoaded)?;

    writeln!(out, "Source: {}", config.input_path.display())?;
    writeln!(out, "Models: {}", ensemble.num_models())?;
    for model in ensemble.models() {
        let number = model
            .number
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(
            out,
            "  model {}: {} molecules, {} atoms",
            number,
            model.molecules.len(),
            model.atom_count()
        )?;
    }

    writeln!(out, "Molecules: {}", first.molecules.len())?;
    for mol in &first.molecules {
        let sequence = ensemble.one_letter_codes(Some(&mol.name))?;
        writeln!(
            out,
            "  {}: {} atoms, {} bonds, sequence {}",
            mol.name,
            mol.len(),
            mol.bond_count(),
            if sequence.is_empty() { "-" } else { &sequence }
        )?;
    }

    let heterogens = first.heterogens()?;
    if !heterogens.is_empty() {
        writeln!(out, "Heterogens: {}", heterogens.len())?;
        for het in &heterogens {
            let res_num = het
                .res_num
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            writeln!(
                out,
                "  {} {}{}: {} atoms, {}",
                het.res_name,
                het.chain_id,
                res_num,
                het.atom_count,
                het.formula()
            )?;
        }
    }
    Ok(())
}
