//! Read-only analysis of conversion inputs

use std::path::Path;

use shapecad_core::error::Result;
use shapecad_core::models::{DxfAnalysis, GeometryKind, ShapefileAnalysis};
use shapecad_core::CancelSignal;
use shapecad_formats::{DxfFormatReader, FormatReader, ShapefileFormatReader};
use shapecad_geo::CrsRegistry;

/// Summarize a shapefile: geometry kind, CRS, elevation, feature count
pub fn analyze(shp_path: &Path) -> Result<ShapefileAnalysis> {
    let reader = ShapefileFormatReader;
    let cancel = CancelSignal::new();

    let source = reader.read(shp_path, &cancel)?;
    let feature_count = source.shapes.len();
    let output = reader.classify(source, &cancel)?;

    let detection = CrsRegistry::detect(output.crs_text.as_deref().unwrap_or_default());
    let analysis = ShapefileAnalysis {
        geometry_kind: output.records.first().map(|r| r.kind()),
        crs: detection.crs,
        crs_warning: detection.warning,
        has_z: output.has_z(),
        feature_count,
    };

    tracing::info!(
        path = %shp_path.display(),
        kind = ?analysis.geometry_kind,
        crs = %analysis.crs,
        features = analysis.feature_count,
        "Analyzed shapefile"
    );
    Ok(analysis)
}

/// Summarize a DXF drawing: entity counts by kind, skips, projection hint
pub fn analyze_dxf(dxf_path: &Path) -> Result<DxfAnalysis> {
    let reader = DxfFormatReader;
    let cancel = CancelSignal::new();

    let source = reader.read(dxf_path, &cancel)?;
    let output = reader.classify(source, &cancel)?;

    let count = |kind: GeometryKind| output.records.iter().filter(|r| r.kind() == kind).count();
    let crs_hint = output
        .crs_text
        .as_deref()
        .map(CrsRegistry::detect)
        .filter(|detection| detection.is_recognized())
        .map(|detection| detection.crs);

    let analysis = DxfAnalysis {
        version: output.version.clone().unwrap_or_default(),
        point_count: count(GeometryKind::Point),
        line_count: count(GeometryKind::Line),
        polygon_count: count(GeometryKind::Polygon),
        skipped: output.skipped.clone(),
        crs_hint,
        has_z: output.has_z(),
    };

    tracing::info!(
        path = %dxf_path.display(),
        points = analysis.point_count,
        lines = analysis.line_count,
        polygons = analysis.polygon_count,
        skipped = analysis.skipped.len(),
        "Analyzed DXF"
    );
    Ok(analysis)
}
