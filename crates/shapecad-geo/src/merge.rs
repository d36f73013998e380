//! Merge and split between neutral records and shapefile features

use std::collections::BTreeMap;

use shapecad_core::error::Result;
use shapecad_core::models::{GeometryKind, GeometryRecord, MultiGeometry};

/// Shapefile shape family chosen for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeLayout {
    Point,
    Multipoint,
    Polyline,
    Polygon,
}

/// Group consecutive records that share a kind and source feature into
/// one [`MultiGeometry`] each. Order is preserved.
pub fn group_features(records: Vec<GeometryRecord>) -> Result<Vec<MultiGeometry>> {
    let mut features = Vec::new();
    let mut current: Vec<GeometryRecord> = Vec::new();

    for record in records {
        let continues = current
            .last()
            .map(|last| last.kind() == record.kind() && last.feature_id == record.feature_id)
            .unwrap_or(true);
        if !continues {
            features.push(MultiGeometry::new(std::mem::take(&mut current))?);
        }
        current.push(record);
    }
    if !current.is_empty() {
        features.push(MultiGeometry::new(current)?);
    }

    Ok(features)
}

/// Split records into homogeneous per-kind lists, in kind order
pub fn partition_by_kind(records: Vec<GeometryRecord>) -> BTreeMap<GeometryKind, Vec<GeometryRecord>> {
    let mut layers: BTreeMap<GeometryKind, Vec<GeometryRecord>> = BTreeMap::new();
    for record in records {
        layers.entry(record.kind()).or_default().push(record);
    }
    layers
}

/// Choose the shape family for a homogeneous layer.
///
/// Point layers only use the multipoint type when some feature actually
/// holds more than one point; a single-member feature never inflates the
/// layer type. Lines and polygons carry parts natively.
pub fn shape_layout(kind: GeometryKind, features: &[MultiGeometry]) -> ShapeLayout {
    match kind {
        GeometryKind::Point if features.iter().all(MultiGeometry::is_single) => ShapeLayout::Point,
        GeometryKind::Point => ShapeLayout::Multipoint,
        GeometryKind::Line => ShapeLayout::Polyline,
        GeometryKind::Polygon => ShapeLayout::Polygon,
    }
}
