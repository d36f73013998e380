pub mod conversion;
pub mod crs;
pub mod geometry;

pub use conversion::{
    ConversionConfig, ConversionOutcome, CrsRequest, Direction, DxfAnalysis, DxfFormat,
    DxfVersion, PipelineState, ShapefileAnalysis, SkippedEntity,
};
pub use crs::{CrsDescriptor, Datum, MGA_ZONES};
pub use geometry::{Attributes, Coordinate, GeometryKind, GeometryRecord, MultiGeometry};
