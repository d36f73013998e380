//! Static table of supported Australian coordinate reference systems
//!
//! GDA94 MGA zones 50-56 map to EPSG 28350-28356, GDA2020 MGA zones 50-56
//! to EPSG 7850-7856, and the geographic systems to EPSG 4283 (GDA94) and
//! 7844 (GDA2020). The table is immutable and shared by every conversion.

use shapecad_core::error::{Result, ShapecadError};
use shapecad_core::models::{CrsDescriptor, Datum, MGA_ZONES};

struct CrsEntry {
    datum: Datum,
    zone: Option<u8>,
    epsg: u32,
}

impl CrsEntry {
    const fn new(datum: Datum, zone: Option<u8>, epsg: u32) -> Self {
        Self { datum, zone, epsg }
    }

    fn descriptor(&self) -> CrsDescriptor {
        CrsDescriptor {
            datum: self.datum,
            zone: self.zone,
            epsg: Some(self.epsg),
            is_geographic: self.zone.is_none(),
        }
    }
}

static ENTRIES: [CrsEntry; 16] = [
    CrsEntry::new(Datum::Gda1994, None, 4283),
    CrsEntry::new(Datum::Gda1994, Some(50), 28350),
    CrsEntry::new(Datum::Gda1994, Some(51), 28351),
    CrsEntry::new(Datum::Gda1994, Some(52), 28352),
    CrsEntry::new(Datum::Gda1994, Some(53), 28353),
    CrsEntry::new(Datum::Gda1994, Some(54), 28354),
    CrsEntry::new(Datum::Gda1994, Some(55), 28355),
    CrsEntry::new(Datum::Gda1994, Some(56), 28356),
    CrsEntry::new(Datum::Gda2020, None, 7844),
    CrsEntry::new(Datum::Gda2020, Some(50), 7850),
    CrsEntry::new(Datum::Gda2020, Some(51), 7851),
    CrsEntry::new(Datum::Gda2020, Some(52), 7852),
    CrsEntry::new(Datum::Gda2020, Some(53), 7853),
    CrsEntry::new(Datum::Gda2020, Some(54), 7854),
    CrsEntry::new(Datum::Gda2020, Some(55), 7855),
    CrsEntry::new(Datum::Gda2020, Some(56), 7856),
];

/// Result of advisory CRS detection
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDetection {
    pub crs: CrsDescriptor,
    /// Set when the input was missing, unrecognized, or only partly recognized
    pub warning: Option<String>,
}

impl CrsDetection {
    fn recognized(crs: CrsDescriptor) -> Self {
        Self { crs, warning: None }
    }

    fn flagged(crs: CrsDescriptor, warning: impl Into<String>) -> Self {
        Self { crs, warning: Some(warning.into()) }
    }

    /// True when the input mapped onto a table entry
    pub fn is_recognized(&self) -> bool {
        self.warning.is_none() && self.crs.epsg.is_some()
    }
}

/// Lookup and detection over the static CRS table
pub struct CrsRegistry;

impl CrsRegistry {
    /// All supported systems, geographic first within each datum
    pub fn entries() -> impl Iterator<Item = CrsDescriptor> {
        ENTRIES.iter().map(CrsEntry::descriptor)
    }

    /// Resolve a datum/zone pair; a missing zone selects the geographic system
    pub fn resolve(datum: Datum, zone: Option<u8>) -> Result<CrsDescriptor> {
        if datum == Datum::Unknown {
            return match zone {
                None => Ok(CrsDescriptor::unknown(false)),
                Some(zone) => Err(ShapecadError::UnsupportedCrs {
                    reason: format!("MGA zone {} requires a GDA1994 or GDA2020 datum", zone),
                }),
            };
        }

        ENTRIES
            .iter()
            .find(|e| e.datum == datum && e.zone == zone)
            .map(CrsEntry::descriptor)
            .ok_or_else(|| ShapecadError::UnsupportedCrs {
                reason: format!(
                    "zone {} is outside MGA zones {}-{} for {}",
                    zone.map(|z| z.to_string()).unwrap_or_default(),
                    MGA_ZONES.start(),
                    MGA_ZONES.end(),
                    datum
                ),
            })
    }

    /// Reverse lookup by EPSG code
    pub fn lookup_epsg(code: u32) -> Option<CrsDescriptor> {
        ENTRIES.iter().find(|e| e.epsg == code).map(CrsEntry::descriptor)
    }

    /// Recognize a CRS from an EPSG code, a `.prj` WKT string, or a label
    /// such as `MGA2020 zone 55`. Never fails: unrecognized input yields an
    /// `Unknown` descriptor with a warning.
    pub fn detect(raw: &str) -> CrsDetection {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CrsDetection::flagged(
                CrsDescriptor::unknown(false),
                "No projection information found",
            );
        }

        // Bare codes: "7855", "EPSG:7855"
        if let Some(code) = parse_bare_code(trimmed) {
            return match Self::lookup_epsg(code) {
                Some(crs) => CrsDetection::recognized(crs),
                None => CrsDetection::flagged(
                    CrsDescriptor::unknown(false),
                    format!("EPSG:{} is outside the supported GDA94/GDA2020 table", code),
                ),
            };
        }

        let upper = trimmed.to_uppercase();

        // The outermost authority closes the WKT, so the last one names the whole CRS
        let authority = last_epsg_authority(&upper);
        if let Some(crs) = authority.and_then(Self::lookup_epsg) {
            return CrsDetection::recognized(crs);
        }

        let is_geographic = looks_geographic(&upper);
        let compact: String = upper.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

        let datum = detect_datum(&compact);
        if datum == Datum::Unknown {
            let reason = match authority {
                Some(code) => format!("EPSG:{} is outside the supported GDA94/GDA2020 table", code),
                None => format!("Unrecognized CRS: {}", snippet(trimmed)),
            };
            return CrsDetection::flagged(CrsDescriptor::unknown(is_geographic), reason);
        }

        match detect_zone(&compact).or_else(|| zone_after_datum_token(&upper)) {
            Some(zone) if MGA_ZONES.contains(&zone) => match Self::resolve(datum, Some(zone)) {
                Ok(crs) => CrsDetection::recognized(crs),
                Err(e) => CrsDetection::flagged(CrsDescriptor::unknown(false), e.to_string()),
            },
            Some(zone) => CrsDetection::flagged(
                CrsDescriptor { datum, zone: None, epsg: None, is_geographic: false },
                format!("{} zone {} is outside MGA zones 50-56", datum, zone),
            ),
            None if is_geographic => match Self::resolve(datum, None) {
                Ok(crs) => CrsDetection::recognized(crs),
                Err(e) => CrsDetection::flagged(CrsDescriptor::unknown(true), e.to_string()),
            },
            None => CrsDetection::flagged(
                CrsDescriptor { datum, zone: None, epsg: None, is_geographic: false },
                format!("{} projected system without a recognizable MGA zone", datum),
            ),
        }
    }
}

fn parse_bare_code(s: &str) -> Option<u32> {
    let upper = s.to_uppercase();
    let digits = upper.strip_prefix("EPSG:").unwrap_or(&upper).trim();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Last `AUTHORITY["EPSG","n"]` (WKT1) or `ID["EPSG",n]` (WKT2) code
fn last_epsg_authority(upper: &str) -> Option<u32> {
    let mut found = None;
    for marker in ["AUTHORITY[\"EPSG\",", "ID[\"EPSG\","] {
        let mut rest = upper;
        while let Some(pos) = rest.find(marker) {
            let after = &rest[pos + marker.len()..];
            let digits: String = after
                .chars()
                .skip_while(|c| *c == '"' || c.is_whitespace())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(code) = digits.parse::<u32>() {
                // Keep whichever occurrence sits furthest right
                let absolute = upper.len() - after.len();
                found = match found {
                    Some((at, _)) if at > absolute => found,
                    _ => Some((absolute, code)),
                };
            }
            rest = after;
        }
    }
    found.map(|(_, code)| code)
}

fn looks_geographic(upper: &str) -> bool {
    let start = upper.trim_start();
    if start.starts_with("GEOGCS") || start.starts_with("GEOGCRS") {
        return true;
    }
    !(upper.contains("PROJCS")
        || upper.contains("PROJCRS")
        || upper.contains("MGA")
        || upper.contains("ZONE"))
}

fn detect_datum(compact: &str) -> Datum {
    if compact.contains("GDA2020") || compact.contains("MGA2020") {
        Datum::Gda2020
    } else if ["GDA1994", "GDA94", "MGA1994", "MGA94"].iter().any(|m| compact.contains(m)) {
        Datum::Gda1994
    } else {
        Datum::Unknown
    }
}

fn detect_zone(compact: &str) -> Option<u8> {
    if let Some(zone) = digits_after(compact, "ZONE", 2) {
        return Some(zone);
    }
    // "MGA55" but not "MGA2020"
    let mut rest = compact;
    while let Some(pos) = rest.find("MGA") {
        let after = &rest[pos + 3..];
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.len() == 2 {
            return digits.parse().ok();
        }
        rest = after;
    }
    None
}

/// Hand-typed labels such as `MGA94 52`: a two-digit token right after a datum token
fn zone_after_datum_token(upper: &str) -> Option<u8> {
    const DATUM_TOKENS: [&str; 6] = ["MGA94", "MGA1994", "MGA2020", "GDA94", "GDA1994", "GDA2020"];
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.windows(2).find_map(|pair| {
        let is_zone = pair[1].len() == 2 && pair[1].chars().all(|c| c.is_ascii_digit());
        if DATUM_TOKENS.contains(&pair[0]) && is_zone {
            pair[1].parse().ok()
        } else {
            None
        }
    })
}

fn digits_after(compact: &str, marker: &str, max: usize) -> Option<u8> {
    let pos = compact.find(marker)?;
    let digits: String =
        compact[pos + marker.len()..].chars().take_while(|c| c.is_ascii_digit()).take(max).collect();
    digits.parse().ok()
}

fn snippet(s: &str) -> String {
    let mut out: String = s.chars().take(60).collect();
    if s.chars().count() > 60 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_projected() {
        let crs = CrsRegistry::resolve(Datum::Gda2020, Some(55)).unwrap();
        assert_eq!(crs.epsg, Some(7855));
        assert!(!crs.is_geographic);

        let crs = CrsRegistry::resolve(Datum::Gda1994, Some(50)).unwrap();
        assert_eq!(crs.epsg, Some(28350));
    }

    #[test]
    fn test_resolve_geographic() {
        assert_eq!(CrsRegistry::resolve(Datum::Gda1994, None).unwrap().epsg, Some(4283));
        let crs = CrsRegistry::resolve(Datum::Gda2020, None).unwrap();
        assert_eq!(crs.epsg, Some(7844));
        assert!(crs.is_geographic);
    }

    #[test]
    fn test_resolve_out_of_range_zone() {
        let err = CrsRegistry::resolve(Datum::Gda1994, Some(49)).unwrap_err();
        assert!(matches!(err, ShapecadError::UnsupportedCrs { .. }));
        assert!(CrsRegistry::resolve(Datum::Gda2020, Some(57)).is_err());
        assert!(CrsRegistry::resolve(Datum::Unknown, Some(55)).is_err());
        assert!(CrsRegistry::resolve(Datum::Unknown, None).unwrap().is_unknown());
    }

    #[test]
    fn test_entries_are_consistent() {
        for crs in CrsRegistry::entries() {
            let resolved = CrsRegistry::resolve(crs.datum, crs.zone).unwrap();
            assert_eq!(resolved, crs);
            assert_eq!(CrsRegistry::lookup_epsg(crs.epsg.unwrap()), Some(crs));
        }
        assert_eq!(CrsRegistry::entries().count(), 16);
    }

    #[test]
    fn test_detect_bare_codes() {
        assert!(CrsRegistry::detect("7855").is_recognized());
        let detection = CrsRegistry::detect("EPSG:28356");
        assert_eq!(detection.crs.zone, Some(56));
        assert_eq!(detection.crs.datum, Datum::Gda1994);

        let detection = CrsRegistry::detect("EPSG:4326");
        assert!(detection.crs.is_unknown());
        assert_eq!(detection.crs.epsg, None);
        assert!(detection.warning.unwrap().contains("4326"));
    }

    #[test]
    fn test_detect_esri_wkt() {
        let wkt = r#"PROJCS["GDA_1994_MGA_Zone_56",GEOGCS["GCS_GDA_1994",DATUM["D_GDA_1994",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",10000000.0],PARAMETER["Central_Meridian",153.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;
        let detection = CrsRegistry::detect(wkt);
        assert!(detection.is_recognized());
        assert_eq!(detection.crs.epsg, Some(28356));
    }

    #[test]
    fn test_detect_wkt_with_authority_uses_outermost() {
        let wkt = r#"PROJCS["GDA2020 / MGA zone 50",GEOGCS["GDA2020",DATUM["Geocentric_Datum_of_Australia_2020",SPHEROID["GRS 1980",6378137,298.257222101,AUTHORITY["EPSG","7019"]],AUTHORITY["EPSG","1168"]],AUTHORITY["EPSG","7844"]],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","7850"]]"#;
        let detection = CrsRegistry::detect(wkt);
        assert_eq!(detection.crs.epsg, Some(7850));
    }

    #[test]
    fn test_detect_geographic() {
        let wkt = r#"GEOGCS["GCS_GDA2020",DATUM["D_GDA2020",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        let detection = CrsRegistry::detect(wkt);
        assert_eq!(detection.crs.epsg, Some(7844));
        assert!(detection.crs.is_geographic);
    }

    #[test]
    fn test_detect_labels() {
        assert_eq!(CrsRegistry::detect("MGA2020 Zone 54").crs.epsg, Some(7854));
        assert_eq!(CrsRegistry::detect("GDA94 / MGA zone 51").crs.epsg, Some(28351));
        assert_eq!(CrsRegistry::detect("MGA94 52").crs.epsg, Some(28352));
        assert_eq!(CrsRegistry::detect("GDA2020 - 56").crs.epsg, Some(7856));
        assert!(CrsRegistry::detect("MGA94 49").warning.unwrap().contains("49"));
        assert_eq!(CrsRegistry::detect("GDA2020").crs.epsg, Some(7844));
    }

    #[test]
    fn test_detect_partial_matches_warn() {
        let detection = CrsRegistry::detect("MGA2020");
        assert_eq!(detection.crs.datum, Datum::Gda2020);
        assert_eq!(detection.crs.epsg, None);
        assert!(detection.warning.is_some());

        let detection = CrsRegistry::detect("GDA_1994_MGA_Zone_49");
        assert_eq!(detection.crs.zone, None);
        assert!(detection.warning.unwrap().contains("49"));
    }

    #[test]
    fn test_detect_garbage_never_fails() {
        for raw in ["", "   ", "garbage", "\u{1F600}\u{1F600}", "EPSG:", "PROJCS[", "AUTHORITY[\"EPSG\",\""] {
            let detection = CrsRegistry::detect(raw);
            assert!(detection.crs.is_unknown(), "{raw:?} should be unknown");
            assert_eq!(detection.crs.epsg, None);
            assert!(detection.warning.is_some());
        }
    }

    #[test]
    fn test_detect_round_trips_own_wkt() {
        for crs in CrsRegistry::entries() {
            let wkt = crs.to_esri_wkt().unwrap();
            assert_eq!(CrsRegistry::detect(&wkt).crs, crs, "{}", wkt);
        }
    }
}
