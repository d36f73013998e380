use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ShapeCAD - Shapefile <-> DXF conversion with GDA94/GDA2020 MGA support
#[derive(Parser, Debug)]
#[command(name = "shapecad")]
#[command(about = "Convert between ESRI Shapefile and DXF", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a DXF drawing to a shapefile or a shapefile to DXF
    Convert(ConvertArgs),

    /// Summarize a shapefile or DXF drawing without converting it
    Analyze(AnalyzeArgs),

    /// Inspect the supported coordinate reference systems
    Crs(CrsArgs),

    /// Show effective configuration values and where they came from
    Config,
}

/// Conversion direction selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DirectionArg {
    /// DXF input, shapefile output
    DxfToShp,
    /// Shapefile input, DXF output
    ShpToDxf,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Input file (.dxf or .shp)
    pub input: PathBuf,

    /// Output file (.shp or .dxf)
    pub output: PathBuf,

    /// Conversion direction (inferred from file extensions by default)
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Datum of the output shapefile (GDA1994 or GDA2020)
    #[arg(long)]
    pub datum: Option<String>,

    /// MGA zone 50-56, or 'geographic'
    #[arg(long)]
    pub zone: Option<String>,

    /// Geometry kind to keep (point, line, polygon, or all)
    #[arg(long, value_name = "KIND")]
    pub only: Option<String>,

    /// DXF release to write (R12, R2000 ... R2018)
    #[arg(long)]
    pub dxf_version: Option<String>,

    /// Write binary DXF instead of ASCII
    #[arg(long)]
    pub binary: bool,

    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Shapefile (.shp) or DXF drawing (.dxf)
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CrsArgs {
    #[command(subcommand)]
    pub command: CrsCommand,
}

#[derive(Subcommand, Debug)]
pub enum CrsCommand {
    /// List every supported datum/zone with its EPSG code
    List,

    /// Recognize a CRS from an EPSG code, WKT text, or a .prj file
    Detect(DetectArgs),
}

#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// EPSG code, WKT string, label, or path to a .prj file
    pub input: String,
}
