use super::{StructureFormat, load_ensemble};
use crate::cli::ConvertArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{debug, info};

pub fn run(args: ConvertArgs) -> Result<()> {
    let config = PartialConfig::resolve(&args.load)?;
    let output_format = StructureFormat::from_path(&args.output)?;
    let mut ensemble = load_ensemble(&config)?;

    if args.mean {
        ensemble.mean()?;
        info!("Averaged all models into one.");
    }
    if args.connect {
        ensemble.infer_connectivity();
        debug!("Inferred connectivity for all molecules.");
    }
    if let Some(shift) = &args.translate {
        ensemble.translate(shift, args.model, None)?;
        info!(x = shift.x, y = shift.y, z = shift.z, "Translated atoms.");
    }

    let mut writer = BufWriter::new(File::create(&args.output)?);
    match output_format {
        StructureFormat::Pdb => ensemble.write_pdb(&mut writer, args.model)?,
        StructureFormat::Xyz => ensemble.write_xyz(&mut writer, args.model)?,
    }
    writer.flush()?;

    info!(path = ?args.output, format = ?output_format, "Structure written.");
    Ok(())
}
