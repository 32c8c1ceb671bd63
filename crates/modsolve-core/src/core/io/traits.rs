use crate::core::model::ModelSystem;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading model file formats.
///
/// Implementors handle format-specific parsing and produce a validated
/// [`ModelSystem`]. The trait provides a path-based convenience wrapper so
/// callers only deal with readers when they need to.
pub trait ModelFile {
    /// The error type for read operations.
    type Error: Error + From<io::Error>;

    /// Reads a model from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails, the model is structurally invalid,
    /// or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<ModelSystem, Self::Error>;

    /// Reads a model from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<ModelSystem, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
