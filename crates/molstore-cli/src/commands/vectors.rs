use super::{load_ensemble, open_output};
use crate::cli::VectorsArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use molstore::query::bond_vectors::{BondVectorQuery, BondVectors};
use std::io::Write;
use tracing::{info, warn};

pub fn run(args: VectorsArgs) -> Result<()> {
    let mut out = open_output(None)?;
    report(&args, &mut out)?;
    out.flush()?;
    Ok(())
}

fn report(args: &VectorsArgs, out: &mut impl Write) -> Result<()> {
    let config = PartialConfig::resolve(&args.load)?;
    let mut ensemble = load_ensemble(&config)?;

    let query = BondVectorQuery {
        attached: args.attached.clone(),
        model_num: args.model,
        mol_name: args.mol_name.clone(),
        res_num: args.res_num,
        res_name: args.res_name.clone(),
        atom_num: args.atom_num,
        atom_name: args.atom_name.clone(),
    };
    let result = ensemble.bond_vectors(&query)?;
    for warning in &result.warnings {
        warn!(%warning, "Bond vector skipped.");
    }

    write_vectors(&result, out)?;
    info!(
        vectors = result.vectors.len(),
        warnings = result.warnings.len(),
        "Bond vectors computed."
    );
    Ok(())
}

/// One `x y z length` row per vector, after a comment naming the attached atom.
fn write_vectors(result: &BondVectors, out: &mut impl Write) -> std::io::Result<()> {
    if let Some(name) = &result.attached_name {
        writeln!(out, "# attached: {}", name)?;
    }
    for v in &result.vectors {
        writeln!(out, "{:.4} {:.4} {:.4} {:.4}", v.x, v.y, v.z, v.norm())?;
    }
    Ok(())
}
