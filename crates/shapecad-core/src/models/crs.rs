//! Narrow coordinate reference system descriptor.
//!
//! Only the Australian GDA94/GDA2020 geographic and MGA projected systems are
//! modelled. Descriptors with a known EPSG code are built by the registry in
//! `shapecad-geo`; anything else is [`Datum::Unknown`] with no code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Valid Map Grid of Australia zones
pub const MGA_ZONES: RangeInclusive<u8> = 50..=56;

/// Geodetic datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datum {
    #[serde(rename = "GDA1994")]
    Gda1994,
    #[serde(rename = "GDA2020")]
    Gda2020,
    Unknown,
}

impl Datum {
    /// Datum name as used in ESRI WKT (`GDA_1994`, `GDA2020`)
    pub fn esri_name(&self) -> &'static str {
        match self {
            Datum::Gda1994 => "GDA_1994",
            Datum::Gda2020 => "GDA2020",
            Datum::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Gda1994 => write!(f, "GDA1994"),
            Datum::Gda2020 => write!(f, "GDA2020"),
            Datum::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Coordinate reference system descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsDescriptor {
    pub datum: Datum,
    pub zone: Option<u8>,
    pub epsg: Option<u32>,
    pub is_geographic: bool,
}

impl CrsDescriptor {
    /// Descriptor for an unrecognized system
    pub fn unknown(is_geographic: bool) -> Self {
        Self { datum: Datum::Unknown, zone: None, epsg: None, is_geographic }
    }

    pub fn is_unknown(&self) -> bool {
        self.datum == Datum::Unknown
    }

    /// Human-readable label, e.g. `GDA2020 / MGA zone 55 (EPSG:7855)`
    pub fn label(&self) -> String {
        let mut label = match (self.datum, self.zone) {
            (Datum::Unknown, _) => "Unknown CRS".to_string(),
            (datum, Some(zone)) => format!("{} / MGA zone {}", datum, zone),
            (datum, None) if self.is_geographic => format!("{} geographic", datum),
            (datum, None) => format!("{} / MGA (zone unspecified)", datum),
        };
        if let Some(epsg) = self.epsg {
            label.push_str(&format!(" (EPSG:{})", epsg));
        }
        label
    }

    /// ESRI-flavoured WKT suitable for a shapefile `.prj`; `None` for unknown systems
    pub fn to_esri_wkt(&self) -> Option<String> {
        if self.is_unknown() {
            return None;
        }
        let datum = self.datum.esri_name();
        let geogcs = format!(
            "GEOGCS[\"GCS_{datum}\",DATUM[\"D_{datum}\",SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],\
             PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]"
        );
        match self.zone {
            None if self.is_geographic => Some(geogcs),
            None => None,
            Some(zone) => {
                let central_meridian = zone as i32 * 6 - 183;
                Some(format!(
                    "PROJCS[\"{datum}_MGA_Zone_{zone}\",{geogcs},PROJECTION[\"Transverse_Mercator\"],\
                     PARAMETER[\"False_Easting\",500000.0],PARAMETER[\"False_Northing\",10000000.0],\
                     PARAMETER[\"Central_Meridian\",{central_meridian}.0],PARAMETER[\"Scale_Factor\",0.9996],\
                     PARAMETER[\"Latitude_Of_Origin\",0.0],UNIT[\"Meter\",1.0]]"
                ))
            }
        }
    }
}

impl fmt::Display for CrsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mga2020_55() -> CrsDescriptor {
        CrsDescriptor { datum: Datum::Gda2020, zone: Some(55), epsg: Some(7855), is_geographic: false }
    }

    #[test]
    fn test_unknown_has_no_epsg() {
        let crs = CrsDescriptor::unknown(true);
        assert!(crs.is_unknown());
        assert_eq!(crs.epsg, None);
        assert_eq!(crs.to_esri_wkt(), None);
    }

    #[test]
    fn test_label() {
        assert_eq!(mga2020_55().label(), "GDA2020 / MGA zone 55 (EPSG:7855)");
        let geo = CrsDescriptor { datum: Datum::Gda1994, zone: None, epsg: Some(4283), is_geographic: true };
        assert_eq!(geo.label(), "GDA1994 geographic (EPSG:4283)");
    }

    #[test]
    fn test_projected_wkt() {
        let wkt = mga2020_55().to_esri_wkt().unwrap();
        assert!(wkt.starts_with("PROJCS[\"GDA2020_MGA_Zone_55\""));
        assert!(wkt.contains("PARAMETER[\"Central_Meridian\",147.0]"));
        assert!(wkt.contains("D_GDA2020"));
    }

    #[test]
    fn test_geographic_wkt() {
        let geo = CrsDescriptor { datum: Datum::Gda1994, zone: None, epsg: Some(4283), is_geographic: true };
        let wkt = geo.to_esri_wkt().unwrap();
        assert!(wkt.starts_with("GEOGCS[\"GCS_GDA_1994\""));
    }

    #[test]
    fn test_datum_serde_names() {
        assert_eq!(serde_json::to_string(&Datum::Gda1994).unwrap(), "\"GDA1994\"");
        let parsed: Datum = serde_json::from_str("\"GDA2020\"").unwrap();
        assert_eq!(parsed, Datum::Gda2020);
    }
}
