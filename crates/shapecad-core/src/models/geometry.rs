//! Format-neutral geometry model.
//!
//! Readers produce [`GeometryRecord`]s and writers consume them; nothing in
//! here knows about DXF entities or shapefile shape types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ShapecadError};

/// Scalar attributes carried opaquely alongside a geometry
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// A single vertex, with optional elevation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    /// Create a 2D coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a 3D coordinate
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Elevation, treating a missing Z as 0
    pub fn z_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// True when the elevation is present and non-zero
    pub fn has_elevation(&self) -> bool {
        self.z.map(|z| z != 0.0).unwrap_or(false)
    }

    /// Planar equality, ignoring Z
    pub fn same_xy(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Semantic geometry class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 3] = [GeometryKind::Point, GeometryKind::Line, GeometryKind::Polygon];

    /// Plural lowercase name, used for per-kind output naming
    pub fn plural(&self) -> &'static str {
        match self {
            GeometryKind::Point => "points",
            GeometryKind::Line => "lines",
            GeometryKind::Polygon => "polygons",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "Point"),
            GeometryKind::Line => write!(f, "Line"),
            GeometryKind::Polygon => write!(f, "Polygon"),
        }
    }
}

/// One geometry in the neutral model.
///
/// A Point holds one part with one coordinate, a Line one open vertex
/// sequence, a Polygon one or more closed rings with the outer boundary
/// first. The kind is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    kind: GeometryKind,
    parts: Vec<Vec<Coordinate>>,

    /// Index of the source feature or entity this record came from.
    /// Records split from one multi-part source share it.
    pub feature_id: usize,

    pub attributes: Attributes,
}

impl GeometryRecord {
    /// Create a Point record
    pub fn point(feature_id: usize, coordinate: Coordinate) -> Self {
        Self {
            kind: GeometryKind::Point,
            parts: vec![vec![coordinate]],
            feature_id,
            attributes: Attributes::new(),
        }
    }

    /// Create a Line record from at least two vertices
    pub fn line(feature_id: usize, vertices: Vec<Coordinate>) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(ShapecadError::InvalidGeometry {
                reason: format!("Line must have at least 2 vertices, found {}", vertices.len()),
            });
        }
        Ok(Self {
            kind: GeometryKind::Line,
            parts: vec![vertices],
            feature_id,
            attributes: Attributes::new(),
        })
    }

    /// Create a Polygon record; every ring must be closed with at least 4 coordinates
    pub fn polygon(feature_id: usize, rings: Vec<Vec<Coordinate>>) -> Result<Self> {
        if rings.is_empty() {
            return Err(ShapecadError::InvalidGeometry {
                reason: "Polygon must have an outer ring".to_string(),
            });
        }
        for (i, ring) in rings.iter().enumerate() {
            if ring.len() < 4 {
                return Err(ShapecadError::InvalidGeometry {
                    reason: format!("Polygon ring {} must have at least 4 coordinates, found {}", i, ring.len()),
                });
            }
            let (first, last) = (ring[0], ring[ring.len() - 1]);
            if !first.same_xy(&last) {
                return Err(ShapecadError::InvalidGeometry {
                    reason: format!("Polygon ring {} is not closed", i),
                });
            }
        }
        Ok(Self { kind: GeometryKind::Polygon, parts: rings, feature_id, attributes: Attributes::new() })
    }

    /// Attach attributes
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Coordinate sequences: the single point, the line vertices, or the polygon rings
    pub fn parts(&self) -> &[Vec<Coordinate>] {
        &self.parts
    }

    /// Outer ring of a polygon, vertices of a line, or the point itself
    pub fn exterior(&self) -> &[Coordinate] {
        &self.parts[0]
    }

    /// Polygon holes; empty for other kinds
    pub fn interiors(&self) -> &[Vec<Coordinate>] {
        &self.parts[1..]
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.parts.iter().flatten()
    }

    /// True if any coordinate carries a non-zero elevation
    pub fn has_z(&self) -> bool {
        self.coordinates().any(Coordinate::has_elevation)
    }

    /// Look up a string attribute
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }
}

/// Homogeneous collection of records written as one feature.
///
/// Never empty; all members share one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGeometry {
    kind: GeometryKind,
    members: Vec<GeometryRecord>,
}

impl MultiGeometry {
    pub fn new(members: Vec<GeometryRecord>) -> Result<Self> {
        let kind = match members.first() {
            Some(first) => first.kind(),
            None => {
                return Err(ShapecadError::InvalidGeometry {
                    reason: "MultiGeometry must have at least one member".to_string(),
                })
            }
        };
        if let Some(other) = members.iter().find(|m| m.kind() != kind) {
            return Err(ShapecadError::InvalidGeometry {
                reason: format!("MultiGeometry mixes {} and {} members", kind, other.kind()),
            });
        }
        Ok(Self { kind, members })
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn members(&self) -> &[GeometryRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    /// Attributes of the first member, which stand for the whole feature
    pub fn attributes(&self) -> &Attributes {
        &self.members[0].attributes
    }

    pub fn has_z(&self) -> bool {
        self.members.iter().any(GeometryRecord::has_z)
    }
}
