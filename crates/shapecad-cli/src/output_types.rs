use serde::Serialize;
use shapecad_core::config::ConfigSource;
use shapecad_core::models::{CrsDescriptor, DxfAnalysis, ShapefileAnalysis};
use tabled::Tabled;

/// Output for analyze command
#[derive(Debug, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum AnalyzeOutput {
    Shapefile(ShapefileAnalysis),
    Dxf(DxfAnalysis),
}

/// One row of `crs list`
#[derive(Debug, Serialize, Tabled)]
pub struct CrsRow {
    #[tabled(rename = "EPSG")]
    pub epsg: u32,
    #[tabled(rename = "Datum")]
    pub datum: String,
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl CrsRow {
    pub fn from_descriptor(crs: &CrsDescriptor) -> Self {
        Self {
            epsg: crs.epsg.unwrap_or_default(),
            datum: crs.datum.to_string(),
            zone: crs.zone.map(|z| z.to_string()).unwrap_or_else(|| "geographic".to_string()),
            name: crs.label(),
        }
    }
}

/// Output for crs detect command
#[derive(Debug, Serialize)]
pub struct DetectOutput {
    pub recognized: bool,
    pub crs: CrsDescriptor,
    pub label: String,
    pub warning: Option<String>,
}

/// One row of `config`
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    #[serde(skip)]
    pub source_label: String,
    #[tabled(skip)]
    pub source: ConfigSource,
}
