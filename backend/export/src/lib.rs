//! Export of assembled fare connections.

pub mod csv_sheet;
pub mod error;

use std::path::{Path, PathBuf};

use railfare_core::Connection;

pub use csv_sheet::{sheet_path, CsvExporter};
pub use error::ExportError;

/// Writes a [`Connection`] into a workbook-like target.
///
/// The sheet is named after [`Connection::sheet_name`]. An existing sheet is
/// overlaid rather than replaced. Returns the path of the written sheet.
pub trait FareExporter {
    fn export(&self, connection: &Connection, target: &Path) -> Result<PathBuf, ExportError>;
}
