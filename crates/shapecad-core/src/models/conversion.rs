//! Conversion configuration, pipeline state, and outcome reports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::crs::{CrsDescriptor, Datum};
use super::geometry::GeometryKind;

/// Conversion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    DxfToShp,
    ShpToDxf,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::DxfToShp => write!(f, "DXF to SHP"),
            Direction::ShpToDxf => write!(f, "SHP to DXF"),
        }
    }
}

/// DXF encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DxfFormat {
    #[default]
    Ascii,
    Binary,
}

/// Target DXF release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DxfVersion {
    R12,
    R2000,
    R2004,
    R2007,
    R2010,
    R2013,
    #[default]
    R2018,
}

impl DxfVersion {
    pub const ALL: [DxfVersion; 7] = [
        DxfVersion::R12,
        DxfVersion::R2000,
        DxfVersion::R2004,
        DxfVersion::R2007,
        DxfVersion::R2010,
        DxfVersion::R2013,
        DxfVersion::R2018,
    ];

    /// Whether this release understands `LWPOLYLINE` (R13 and later)
    pub fn supports_lwpolyline(&self) -> bool {
        !matches!(self, DxfVersion::R12)
    }

    /// Whether the header carries `$PROJECTNAME` (R2004 and later)
    pub fn supports_project_name(&self) -> bool {
        !matches!(self, DxfVersion::R12 | DxfVersion::R2000)
    }
}

impl fmt::Display for DxfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Requested datum/zone pair, resolved against the CRS registry by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsRequest {
    pub datum: Datum,
    /// MGA zone; `None` selects the geographic system of the datum
    pub zone: Option<u8>,
}

impl CrsRequest {
    pub fn mga(datum: Datum, zone: u8) -> Self {
        Self { datum, zone: Some(zone) }
    }

    pub fn geographic(datum: Datum) -> Self {
        Self { datum, zone: None }
    }
}

/// Options for one conversion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub direction: Direction,

    /// Target CRS; required for DXF to SHP since DXF carries none
    pub crs: Option<CrsRequest>,

    /// Restrict output to one geometry kind
    pub entity_filter: Option<GeometryKind>,

    pub dxf_format: DxfFormat,
    pub dxf_version: DxfVersion,
}

impl ConversionConfig {
    /// DXF to SHP conversion into the given CRS
    pub fn dxf_to_shp(crs: CrsRequest) -> Self {
        Self {
            direction: Direction::DxfToShp,
            crs: Some(crs),
            entity_filter: None,
            dxf_format: DxfFormat::default(),
            dxf_version: DxfVersion::default(),
        }
    }

    /// SHP to DXF conversion
    pub fn shp_to_dxf() -> Self {
        Self {
            direction: Direction::ShpToDxf,
            crs: None,
            entity_filter: None,
            dxf_format: DxfFormat::default(),
            dxf_version: DxfVersion::default(),
        }
    }

    /// Restrict output to one geometry kind
    pub fn with_filter(mut self, kind: GeometryKind) -> Self {
        self.entity_filter = Some(kind);
        self
    }

    pub fn with_dxf_format(mut self, format: DxfFormat) -> Self {
        self.dxf_format = format;
        self
    }

    pub fn with_dxf_version(mut self, version: DxfVersion) -> Self {
        self.dxf_version = version;
        self
    }
}

/// Conversion pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Reading,
    Classifying,
    ResolvingCrs,
    Writing,
    Done,
    Failed,
}

impl PipelineState {
    /// The single state that may follow this one on the success path
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Reading),
            PipelineState::Reading => Some(PipelineState::Classifying),
            PipelineState::Classifying => Some(PipelineState::ResolvingCrs),
            PipelineState::ResolvingCrs => Some(PipelineState::Writing),
            PipelineState::Writing => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An entity that was not converted, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    /// Position of the entity or shape in the source file
    pub index: usize,
    /// Source type name, e.g. `TEXT` or `Multipatch`
    pub entity_type: String,
    pub reason: String,
}

/// Report produced by a successful conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub direction: Direction,

    /// Number of geometry records written
    pub converted_count: usize,

    /// Entities skipped, with reasons
    pub skipped: Vec<SkippedEntity>,

    /// Records excluded by the entity filter
    pub filtered_count: usize,

    /// CRS used (DXF to SHP) or detected (SHP to DXF)
    pub crs: CrsDescriptor,

    /// Whether any non-zero elevation was observed
    pub has_z: bool,

    /// Advisory messages for the caller to display
    pub warnings: Vec<String>,

    /// Files created, main geometry file per layer
    pub outputs: Vec<PathBuf>,
}

impl ConversionOutcome {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Read-only summary of a shapefile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapefileAnalysis {
    /// Kind of the geometries found; `None` if the file holds no geometries
    pub geometry_kind: Option<GeometryKind>,
    pub crs: CrsDescriptor,
    /// Set when the projection metadata was missing or unrecognized
    pub crs_warning: Option<String>,
    pub has_z: bool,
    pub feature_count: usize,
}

/// Read-only summary of a DXF drawing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DxfAnalysis {
    pub version: String,
    pub point_count: usize,
    pub line_count: usize,
    pub polygon_count: usize,
    pub skipped: Vec<SkippedEntity>,
    /// CRS recovered from projection text in the drawing header, if any
    pub crs_hint: Option<CrsDescriptor>,
    pub has_z: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_sequence() {
        let mut state = PipelineState::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            state = next;
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                PipelineState::Idle,
                PipelineState::Reading,
                PipelineState::Classifying,
                PipelineState::ResolvingCrs,
                PipelineState::Writing,
                PipelineState::Done,
            ]
        );
        assert!(PipelineState::Failed.is_terminal());
        assert_eq!(PipelineState::Failed.next(), None);
    }

    #[test]
    fn test_config_builders() {
        let config = ConversionConfig::dxf_to_shp(CrsRequest::mga(Datum::Gda1994, 50))
            .with_filter(GeometryKind::Polygon)
            .with_dxf_format(DxfFormat::Binary);
        assert_eq!(config.direction, Direction::DxfToShp);
        assert_eq!(config.crs.unwrap().zone, Some(50));
        assert_eq!(config.entity_filter, Some(GeometryKind::Polygon));
        assert_eq!(config.dxf_format, DxfFormat::Binary);

        let config = ConversionConfig::shp_to_dxf();
        assert_eq!(config.dxf_version, DxfVersion::R2018);
        assert!(config.crs.is_none());
    }

    #[test]
    fn test_lwpolyline_support() {
        assert!(!DxfVersion::R12.supports_lwpolyline());
        assert!(DxfVersion::R2010.supports_lwpolyline());
    }

    #[test]
    fn test_project_name_support() {
        assert!(!DxfVersion::R12.supports_project_name());
        assert!(!DxfVersion::R2000.supports_project_name());
        assert!(DxfVersion::R2004.supports_project_name());
        assert!(DxfVersion::R2018.supports_project_name());
    }
}
