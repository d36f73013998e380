//! ShapeCAD Geo - CRS registry and geometry algorithms
//!
//! This crate holds the format-independent algorithms of the conversion
//! engine: the Australian CRS table, polyline classification, circle
//! approximation, ring orientation, and multi-geometry grouping.

pub mod classify;
pub mod merge;
pub mod registry;
pub mod validation;

pub use classify::{approximate_circle, classify_polyline, Classification, CIRCLE_SEGMENTS};
pub use merge::{group_features, partition_by_kind, shape_layout, ShapeLayout};
pub use registry::{CrsDetection, CrsRegistry};
pub use validation::{orient_for_shapefile, orient_ring, validate_record, ValidationResult};
