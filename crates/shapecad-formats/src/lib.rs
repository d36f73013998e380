//! ShapeCAD Formats - DXF and Shapefile adapters
//!
//! Each format implements [`FormatReader`] to turn a file into neutral
//! [`GeometryRecord`]s, and [`FormatWriter`] to serialize them back out.
//! Reading is split in two phases so the pipeline can report the
//! `Reading` and `Classifying` states separately: [`FormatReader::read`]
//! parses the file structure, [`FormatReader::classify`] maps the parsed
//! items onto the geometry model.

use std::path::{Path, PathBuf};

use shapecad_core::models::{CrsDescriptor, GeometryRecord, SkippedEntity};
use shapecad_core::{CancelSignal, Result};

pub mod dxf;
pub mod prj;
pub mod shapefile;
pub mod staging;
pub mod validation;

pub use crate::dxf::{DxfFormatReader, DxfFormatWriter, DxfSource};
pub use crate::shapefile::{ShapefileFormatReader, ShapefileFormatWriter, ShapefileSource};
pub use validation::{FormatValidation, FormatValidator};

/// Format reader trait implemented by every input format
pub trait FormatReader {
    /// Parsed file contents, before classification
    type Source;

    /// Get supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "DXF")
    fn format_name(&self) -> &str;

    /// Check the file structure without parsing it
    fn validate(&self, path: &Path) -> FormatValidation {
        FormatValidator::validate_file_exists(path)
    }

    /// Parse the file structure
    fn read(&self, path: &Path, cancel: &CancelSignal) -> Result<Self::Source>;

    /// Map parsed items onto neutral geometry records
    fn classify(&self, source: Self::Source, cancel: &CancelSignal) -> Result<ReadOutput>;
}

/// Format writer trait implemented by every output format
pub trait FormatWriter {
    fn format_name(&self) -> &str;

    /// Write records to `path`. Output files appear only if the whole
    /// write succeeds.
    fn write(&self, path: &Path, request: &WriteRequest<'_>, cancel: &CancelSignal)
        -> Result<WriteReport>;
}

/// Neutral records produced by a reader
#[derive(Debug, Clone, Default)]
pub struct ReadOutput {
    pub records: Vec<GeometryRecord>,

    /// Entities that could not be represented, with reasons
    pub skipped: Vec<SkippedEntity>,

    /// Raw projection text found in the source (`.prj` WKT or DXF header)
    pub crs_text: Option<String>,

    /// Source format version, when the format has one
    pub version: Option<String>,

    pub warnings: Vec<String>,
}

impl ReadOutput {
    pub fn skip(&mut self, index: usize, entity_type: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedEntity { index, entity_type: entity_type.into(), reason: reason.into() };
        tracing::warn!(
            index = skipped.index,
            entity_type = %skipped.entity_type,
            reason = %skipped.reason,
            "Skipping entity"
        );
        self.skipped.push(skipped);
    }

    /// True if any record carries a non-zero elevation
    pub fn has_z(&self) -> bool {
        self.records.iter().any(GeometryRecord::has_z)
    }
}

/// Everything a writer needs besides the target path
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub records: &'a [GeometryRecord],
    pub crs: &'a CrsDescriptor,
    /// Emit Z-aware output
    pub has_z: bool,
}

/// Files produced by a writer
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Main output file per layer
    pub outputs: Vec<PathBuf>,
    pub warnings: Vec<String>,
}
