//! Analyze command implementation

use crate::cli::AnalyzeArgs;
use crate::output::OutputWriter;
use crate::output_types::AnalyzeOutput;
use anyhow::{bail, Context, Result};
use shapecad_core::models::{DxfAnalysis, ShapefileAnalysis};
use shapecad_pipeline::{analyze, analyze_dxf};

pub fn execute(args: AnalyzeArgs, output: &OutputWriter) -> Result<()> {
    let extension = args
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let result = match extension.as_str() {
        "shp" => AnalyzeOutput::Shapefile(
            analyze(&args.path)
                .with_context(|| format!("Failed to analyze {}", args.path.display()))?,
        ),
        "dxf" => AnalyzeOutput::Dxf(
            analyze_dxf(&args.path)
                .with_context(|| format!("Failed to analyze {}", args.path.display()))?,
        ),
        _ => bail!("Unsupported file type: {} (expected .shp or .dxf)", args.path.display()),
    };

    if output.is_json() {
        return output.result(result);
    }

    output.section(format!("Analysis: {}", args.path.display()));
    match result {
        AnalyzeOutput::Shapefile(analysis) => show_shapefile(&analysis, output),
        AnalyzeOutput::Dxf(analysis) => show_dxf(&analysis, output),
    }
    Ok(())
}

fn show_shapefile(analysis: &ShapefileAnalysis, output: &OutputWriter) {
    output.kv("Format", "ESRI Shapefile");
    output.kv(
        "Geometry",
        analysis.geometry_kind.map(|k| k.to_string()).unwrap_or_else(|| "none".to_string()),
    );
    output.kv("Features", analysis.feature_count);
    output.kv("CRS", analysis.crs.label());
    output.kv("Elevation", if analysis.has_z { "yes" } else { "no" });

    if let Some(ref warning) = analysis.crs_warning {
        output.warning(warning);
    }
}

fn show_dxf(analysis: &DxfAnalysis, output: &OutputWriter) {
    output.kv("Format", format!("DXF ({})", analysis.version));
    output.kv("Points", analysis.point_count);
    output.kv("Lines", analysis.line_count);
    output.kv("Polygons", analysis.polygon_count);
    output.kv("Elevation", if analysis.has_z { "yes" } else { "no" });
    match analysis.crs_hint {
        Some(crs) => output.kv("Header CRS", crs.label()),
        None => output.kv("Header CRS", "none"),
    }

    if !analysis.skipped.is_empty() {
        output.section(format!("Skipped entities ({})", analysis.skipped.len()));
        for skipped in &analysis.skipped {
            output.info(format!("#{} {}: {}", skipped.index, skipped.entity_type, skipped.reason));
        }
    }
}
