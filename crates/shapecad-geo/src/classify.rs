//! Geometry classification for CAD entities
//!
//! A polyline becomes a polygon when it is closed, either by its closed flag
//! or because the last vertex repeats the first, and has at least three
//! distinct vertices. Anything else with two or more vertices is a line.

use std::f64::consts::PI;

use shapecad_core::models::Coordinate;

/// Number of vertices used to approximate a circle
pub const CIRCLE_SEGMENTS: usize = 36;

/// Outcome of classifying a vertex sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Closed ring, first coordinate repeated at the end
    Polygon(Vec<Coordinate>),
    /// Open vertex sequence
    Line(Vec<Coordinate>),
    /// Too few vertices to form any geometry
    Degenerate { reason: String },
}

/// Classify a polyline by its closed flag and its coordinates
pub fn classify_polyline(vertices: Vec<Coordinate>, closed_flag: bool) -> Classification {
    if vertices.len() < 2 {
        return Classification::Degenerate {
            reason: format!("polyline has {} vertices, at least 2 required", vertices.len()),
        };
    }

    let coordinate_closed = vertices.len() > 2 && vertices[0].same_xy(&vertices[vertices.len() - 1]);
    if !(closed_flag || coordinate_closed) {
        return Classification::Line(vertices);
    }

    if !has_three_distinct(&vertices) {
        tracing::debug!(
            vertices = vertices.len(),
            "Closed polyline has under 3 distinct vertices, keeping as line"
        );
        return Classification::Line(vertices);
    }

    let mut ring = vertices;
    if !coordinate_closed {
        ring.push(ring[0]);
    }
    Classification::Polygon(ring)
}

/// Whether at least three vertices differ in XY; stops at the third
fn has_three_distinct(vertices: &[Coordinate]) -> bool {
    let mut seen: Vec<&Coordinate> = Vec::with_capacity(3);
    for vertex in vertices {
        if !seen.iter().any(|s| s.same_xy(vertex)) {
            seen.push(vertex);
            if seen.len() == 3 {
                return true;
            }
        }
    }
    false
}

/// Approximate a circle by a closed counter-clockwise ring of
/// [`CIRCLE_SEGMENTS`] vertices plus the closing vertex.
///
/// Returns `None` for a non-positive or non-finite radius.
pub fn approximate_circle(center: Coordinate, radius: f64) -> Option<Vec<Coordinate>> {
    if !(radius.is_finite() && radius > 0.0) {
        return None;
    }

    let mut ring: Vec<Coordinate> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
            Coordinate {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
                z: center.z,
            }
        })
        .collect();
    ring.push(ring[0]);
    Some(ring)
}
