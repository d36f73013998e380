use geo::{Area, LineString, Winding};
use shapecad_core::error::{Result, ShapecadError};
use shapecad_core::models::{Coordinate, GeometryKind, GeometryRecord};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// First error as an `InvalidGeometry`, if any
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(error) => Err(ShapecadError::InvalidGeometry {
                reason: format!("{}: {}", error.location, error.reason),
            }),
        }
    }
}

/// Check a record for values no output format can represent
pub fn validate_record(record: &GeometryRecord) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (p, part) in record.parts().iter().enumerate() {
        for (i, coord) in part.iter().enumerate() {
            if !coord.x.is_finite() || !coord.y.is_finite() {
                result.add_error(
                    format!("{}[{}][{}]", record.kind(), p, i),
                    "Coordinates must be finite".to_string(),
                );
            } else if coord.z.map(|z| !z.is_finite()).unwrap_or(false) {
                result.add_error(
                    format!("{}[{}][{}]", record.kind(), p, i),
                    "Elevation must be finite".to_string(),
                );
            }
        }

        if record.kind() == GeometryKind::Polygon && planar_area(part) == 0.0 {
            result.add_error(format!("Polygon ring[{}]", p), "Ring has zero area".to_string());
        }
    }

    result
}

fn to_line_string(ring: &[Coordinate]) -> LineString<f64> {
    ring.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>().into()
}

fn planar_area(ring: &[Coordinate]) -> f64 {
    geo::Polygon::new(to_line_string(ring), vec![]).unsigned_area()
}

/// Reverse a ring in place if its winding differs from the requested one.
/// Collinear rings have no winding and are left untouched.
pub fn orient_ring(ring: &mut [Coordinate], clockwise: bool) {
    let line = to_line_string(ring);
    let matches = if clockwise { line.is_cw() } else { line.is_ccw() };
    if !matches && line.winding_order().is_some() {
        ring.reverse();
    }
}

/// Orient polygon rings the way shapefiles expect: outer ring clockwise,
/// holes counter-clockwise
pub fn orient_for_shapefile(rings: &mut [Vec<Coordinate>]) {
    for (i, ring) in rings.iter_mut().enumerate() {
        orient_ring(ring, i == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect()
    }

    fn ccw_square() -> Vec<Coordinate> {
        ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
    }

    #[test]
    fn test_valid_polygon() {
        let record = GeometryRecord::polygon(0, vec![ccw_square()]).unwrap();
        assert!(validate_record(&record).is_valid);
    }

    #[test]
    fn test_non_finite_coordinates() {
        let record = GeometryRecord::point(0, Coordinate::new(f64::NAN, 1.0));
        let result = validate_record(&record);
        assert!(!result.is_valid);
        assert!(result.into_result().is_err());

        let record = GeometryRecord::point(0, Coordinate::with_z(0.0, 1.0, f64::INFINITY));
        assert!(!validate_record(&record).is_valid);
    }

    #[test]
    fn test_zero_area_ring() {
        let flat = ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        let record = GeometryRecord::polygon(0, vec![flat]).unwrap();
        let result = validate_record(&record);
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("zero area"));
    }

    #[test]
    fn test_orient_for_shapefile() {
        let mut hole = ring(&[(0.2, 0.2), (0.2, 0.8), (0.8, 0.8), (0.8, 0.2), (0.2, 0.2)]);
        assert!(to_line_string(&hole).is_cw());
        let mut rings = vec![ccw_square(), std::mem::take(&mut hole)];

        orient_for_shapefile(&mut rings);

        assert!(to_line_string(&rings[0]).is_cw());
        assert!(to_line_string(&rings[1]).is_ccw());
        assert_eq!(rings[0].len(), 5);
        assert!(rings[0][0].same_xy(&rings[0][4]));
    }

    #[test]
    fn test_orient_keeps_elevation() {
        let mut square = vec![
            Coordinate::with_z(0.0, 0.0, 1.0),
            Coordinate::with_z(1.0, 0.0, 2.0),
            Coordinate::with_z(1.0, 1.0, 3.0),
            Coordinate::with_z(0.0, 0.0, 1.0),
        ];
        orient_ring(&mut square, true);
        assert_eq!(square[1].z, Some(3.0));
    }
}
