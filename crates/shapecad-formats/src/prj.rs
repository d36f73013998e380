//! Shapefile `.prj` projection files

use std::fs;
use std::path::Path;

use shapecad_core::error::{Result, ShapecadError};
use shapecad_core::models::CrsDescriptor;

use crate::validation::FormatValidator;

/// Read the `.prj` next to a `.shp`, if there is one
pub fn read_prj(shp_path: &Path) -> Result<Option<String>> {
    let prj_path = FormatValidator::component_path(shp_path, "prj");
    if !prj_path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&prj_path)?;
    // Some tools write Latin-1 names; the WKT keywords are ASCII either way
    let content = String::from_utf8_lossy(&bytes).trim().to_string();
    Ok(if content.is_empty() { None } else { Some(content) })
}

/// Write ESRI WKT for `crs` to `prj_path`. Returns false, writing nothing,
/// when the CRS has no WKT representation.
pub fn write_prj(prj_path: &Path, crs: &CrsDescriptor) -> Result<bool> {
    let Some(wkt) = crs.to_esri_wkt() else {
        return Ok(false);
    };
    fs::write(prj_path, wkt).map_err(|e| ShapecadError::write_failed(prj_path, e.to_string()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecad_core::models::Datum;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("roads.shp");
        let crs = CrsDescriptor { datum: Datum::Gda1994, zone: Some(50), epsg: Some(28350), is_geographic: false };

        assert!(write_prj(&shp.with_extension("prj"), &crs).unwrap());
        let wkt = read_prj(&shp).unwrap().unwrap();
        assert!(wkt.starts_with("PROJCS[\"GDA_1994_MGA_Zone_50\""));
    }

    #[test]
    fn test_unknown_crs_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let prj = dir.path().join("x.prj");
        assert!(!write_prj(&prj, &CrsDescriptor::unknown(false)).unwrap());
        assert!(!prj.exists());
    }

    #[test]
    fn test_missing_or_empty_prj() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("x.shp");
        assert_eq!(read_prj(&shp).unwrap(), None);

        fs::write(shp.with_extension("prj"), "  \n").unwrap();
        assert_eq!(read_prj(&shp).unwrap(), None);
    }
}
