use crate::error::{Result, ShapecadError};
use crate::models::{
    ConversionConfig, CrsRequest, Datum, Direction, DxfFormat, DxfVersion, GeometryKind, MGA_ZONES,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered conversion options
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub datum: ConfigValue<Datum>,
    pub zone: ConfigValue<Option<u8>>,
    pub dxf_version: ConfigValue<DxfVersion>,
    pub dxf_format: ConfigValue<DxfFormat>,
    pub entity_filter: ConfigValue<Option<GeometryKind>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            datum: ConfigValue::new(Datum::Gda2020, ConfigSource::Default),
            zone: ConfigValue::new(Some(50), ConfigSource::Default),
            dxf_version: ConfigValue::new(DxfVersion::R2018, ConfigSource::Default),
            dxf_format: ConfigValue::new(DxfFormat::Ascii, ConfigSource::Default),
            entity_filter: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ShapecadError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ShapecadError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(datum) = file_config.datum {
            self.datum.update(parse_datum(&datum)?, ConfigSource::File);
        }

        if let Some(zone) = file_config.zone {
            self.zone.update(Some(check_zone(zone)?), ConfigSource::File);
        }

        if file_config.geographic == Some(true) {
            self.zone.update(None, ConfigSource::File);
        }

        if let Some(version) = file_config.dxf_version {
            self.dxf_version.update(parse_dxf_version(&version)?, ConfigSource::File);
        }

        if let Some(format) = file_config.dxf_format {
            self.dxf_format.update(parse_dxf_format(&format)?, ConfigSource::File);
        }

        if let Some(filter) = file_config.entity_filter {
            self.entity_filter.update(parse_entity_filter(&filter)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // SHAPECAD_DATUM
        if let Ok(datum_str) = env::var("SHAPECAD_DATUM") {
            match parse_datum(&datum_str) {
                Ok(datum) => self.datum.update(datum, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHAPECAD_DATUM value '{}': expected GDA1994 or GDA2020",
                    datum_str
                ),
            }
        }

        // SHAPECAD_ZONE
        if let Ok(zone_str) = env::var("SHAPECAD_ZONE") {
            match parse_zone(&zone_str) {
                Ok(zone) => self.zone.update(zone, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHAPECAD_ZONE value '{}': expected 50-56 or 'geographic'",
                    zone_str
                ),
            }
        }

        // SHAPECAD_DXF_VERSION
        if let Ok(version_str) = env::var("SHAPECAD_DXF_VERSION") {
            match parse_dxf_version(&version_str) {
                Ok(version) => self.dxf_version.update(version, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHAPECAD_DXF_VERSION value '{}': expected R12, R2000 ... R2018",
                    version_str
                ),
            }
        }

        // SHAPECAD_DXF_FORMAT
        if let Ok(format_str) = env::var("SHAPECAD_DXF_FORMAT") {
            match parse_dxf_format(&format_str) {
                Ok(format) => self.dxf_format.update(format, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHAPECAD_DXF_FORMAT value '{}': expected ascii or binary",
                    format_str
                ),
            }
        }

        // SHAPECAD_ENTITY_FILTER
        if let Ok(filter_str) = env::var("SHAPECAD_ENTITY_FILTER") {
            match parse_entity_filter(&filter_str) {
                Ok(filter) => self.entity_filter.update(filter, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SHAPECAD_ENTITY_FILTER value '{}': expected point, line, polygon, or all",
                    filter_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(datum) = overrides.datum {
            self.datum.update(datum, ConfigSource::Cli);
        }

        if let Some(zone) = overrides.zone {
            self.zone.update(zone, ConfigSource::Cli);
        }

        if let Some(dxf_version) = overrides.dxf_version {
            self.dxf_version.update(dxf_version, ConfigSource::Cli);
        }

        if let Some(dxf_format) = overrides.dxf_format {
            self.dxf_format.update(dxf_format, ConfigSource::Cli);
        }

        if let Some(entity_filter) = overrides.entity_filter {
            self.entity_filter.update(entity_filter, ConfigSource::Cli);
        }
    }

    /// Build the per-call conversion options for a direction
    pub fn to_conversion_config(&self, direction: Direction) -> ConversionConfig {
        let crs = match direction {
            Direction::DxfToShp => {
                Some(CrsRequest { datum: self.datum.value, zone: self.zone.value })
            }
            Direction::ShpToDxf => None,
        };

        ConversionConfig {
            direction,
            crs,
            entity_filter: self.entity_filter.value,
            dxf_format: self.dxf_format.value,
            dxf_version: self.dxf_version.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("datum".to_string(), (self.datum.value.to_string(), self.datum.source));

        map.insert(
            "zone".to_string(),
            (
                self.zone.value.map(|z| z.to_string()).unwrap_or_else(|| "geographic".to_string()),
                self.zone.source,
            ),
        );

        map.insert(
            "dxf_version".to_string(),
            (self.dxf_version.value.to_string(), self.dxf_version.source),
        );

        map.insert(
            "dxf_format".to_string(),
            (format!("{:?}", self.dxf_format.value), self.dxf_format.source),
        );

        map.insert(
            "entity_filter".to_string(),
            (
                self.entity_filter.value.map(|k| k.to_string()).unwrap_or_else(|| "all".to_string()),
                self.entity_filter.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    datum: Option<String>,
    zone: Option<u8>,
    geographic: Option<bool>,
    dxf_version: Option<String>,
    dxf_format: Option<String>,
    entity_filter: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub datum: Option<Datum>,
    /// `Some(None)` selects the geographic system
    pub zone: Option<Option<u8>>,
    pub dxf_version: Option<DxfVersion>,
    pub dxf_format: Option<DxfFormat>,
    /// `Some(None)` clears the filter
    pub entity_filter: Option<Option<GeometryKind>>,
}

/// Parse a datum name; MGA labels name their datum
pub fn parse_datum(s: &str) -> Result<Datum> {
    let compact: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    match compact.to_uppercase().as_str() {
        "GDA1994" | "GDA94" | "MGA1994" | "MGA94" => Ok(Datum::Gda1994),
        "GDA2020" | "MGA2020" => Ok(Datum::Gda2020),
        _ => Err(ShapecadError::ConfigInvalid {
            key: "datum".to_string(),
            reason: format!("Invalid datum: {}. Use GDA1994 or GDA2020", s),
        }),
    }
}

/// Parse an MGA zone; `geographic`/`none` select no zone
pub fn parse_zone(s: &str) -> Result<Option<u8>> {
    let trimmed = s.trim();
    match trimmed.to_lowercase().as_str() {
        "geographic" | "none" => return Ok(None),
        _ => {}
    }
    let zone = trimmed.parse::<u8>().map_err(|_| ShapecadError::ConfigInvalid {
        key: "zone".to_string(),
        reason: format!("Invalid zone: {}. Use 50-56 or 'geographic'", s),
    })?;
    check_zone(zone).map(Some)
}

fn check_zone(zone: u8) -> Result<u8> {
    if MGA_ZONES.contains(&zone) {
        Ok(zone)
    } else {
        Err(ShapecadError::ConfigInvalid {
            key: "zone".to_string(),
            reason: format!("Zone {} is outside MGA zones 50-56", zone),
        })
    }
}

/// Parse a DXF release name
pub fn parse_dxf_version(s: &str) -> Result<DxfVersion> {
    let upper = s.trim().to_uppercase();
    let normalized = if upper.starts_with('R') { upper } else { format!("R{}", upper) };
    DxfVersion::ALL
        .into_iter()
        .find(|v| v.to_string() == normalized)
        .ok_or_else(|| ShapecadError::ConfigInvalid {
            key: "dxf_version".to_string(),
            reason: format!("Invalid DXF version: {}. Use R12, R2000, R2004, R2007, R2010, R2013, or R2018", s),
        })
}

/// Parse a DXF encoding name
pub fn parse_dxf_format(s: &str) -> Result<DxfFormat> {
    match s.to_lowercase().as_str() {
        "ascii" | "text" => Ok(DxfFormat::Ascii),
        "binary" | "bin" => Ok(DxfFormat::Binary),
        _ => Err(ShapecadError::ConfigInvalid {
            key: "dxf_format".to_string(),
            reason: format!("Invalid DXF format: {}. Use ascii or binary", s),
        }),
    }
}

/// Parse a geometry kind name
pub fn parse_geometry_kind(s: &str) -> Result<GeometryKind> {
    match s.to_lowercase().as_str() {
        "point" | "points" => Ok(GeometryKind::Point),
        "line" | "lines" | "linestring" | "polyline" => Ok(GeometryKind::Line),
        "polygon" | "polygons" => Ok(GeometryKind::Polygon),
        _ => Err(ShapecadError::ConfigInvalid {
            key: "entity_filter".to_string(),
            reason: format!("Invalid geometry kind: {}. Use point, line, or polygon", s),
        }),
    }
}

/// Parse an entity filter; `all` clears it
pub fn parse_entity_filter(s: &str) -> Result<Option<GeometryKind>> {
    match s.to_lowercase().as_str() {
        "all" | "none" | "" => Ok(None),
        other => parse_geometry_kind(other).map(Some),
    }
}
