use crate::core::io::LoadOptions;
use crate::core::models::ensemble::Ensemble;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing a coordinate file format.
///
/// Readers add to an existing [`Ensemble`] rather than replacing it, so several files can be
/// loaded into one structure. Writers serialize either one model or all of them.
pub trait StructureFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Decodes a file from a buffered reader and stores it in `ensemble`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or malformed, if reading fails, or if the decoded
    /// data cannot be stored (for instance because a molecule name is already taken).
    fn read_into(
        ensemble: &mut Ensemble,
        reader: &mut impl BufRead,
        options: &LoadOptions,
    ) -> Result<(), Self::Error>;

    /// Serializes the model numbered `model_num`, or every model, to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the ensemble is empty or inconsistent, or if writing fails.
    fn write_to(
        ensemble: &Ensemble,
        model_num: Option<isize>,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Decodes a file from a buffered reader into a fresh ensemble.
    fn read_from(reader: &mut impl BufRead, options: &LoadOptions) -> Result<Ensemble, Self::Error> {
        let mut ensemble = Ensemble::new();
        Self::read_into(&mut ensemble, reader, options)?;
        Ok(ensemble)
    }

    /// Decodes the file at `path` and stores it in `ensemble`.
    ///
    /// The path is recorded as the source of every loaded molecule and its stem is used for
    /// default molecule names.
    fn read_from_path<P: AsRef<Path>>(
        ensemble: &mut Ensemble,
        path: P,
        options: &LoadOptions,
    ) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let options = LoadOptions {
            source_path: Some(path.to_path_buf()),
            ..options.clone()
        };
        Self::read_into(ensemble, &mut reader, &options)
    }

    /// Serializes the ensemble to the file at `path`.
    fn write_to_path<P: AsRef<Path>>(
        ensemble: &Ensemble,
        model_num: Option<isize>,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(ensemble, model_num, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
