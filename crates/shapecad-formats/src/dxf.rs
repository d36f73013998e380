//! DXF reader and writer
//!
//! Reading maps `POINT`, `LINE`, `LWPOLYLINE`, `POLYLINE` and `CIRCLE`
//! entities onto the geometry model; every other entity is skipped with a
//! recorded reason. Writing emits points, lightweight polylines with an
//! elevation where Z is constant, and 3D polylines otherwise.

use std::collections::BTreeSet;
use std::path::Path;

use dxf::entities::{Entity, EntityType, LwPolyline, ModelPoint, Polyline, Vertex};
use dxf::enums::AcadVersion;
use dxf::{Drawing, LwPolylineVertex};

use shapecad_core::error::{Result, ShapecadError};
use shapecad_core::models::{
    Attributes, Coordinate, DxfFormat, DxfVersion, GeometryKind, GeometryRecord,
};
use shapecad_core::CancelSignal;
use shapecad_geo::{approximate_circle, classify_polyline, Classification};

use crate::shapefile::LAYER_FIELD;
use crate::staging::{file_name_of, StagingDir};
use crate::validation::{FormatValidation, FormatValidator};
use crate::{FormatReader, FormatWriter, ReadOutput, WriteReport, WriteRequest};

const FORMAT: &str = "DXF";

// POLYLINE flag bits
const POLYLINE_3D: i32 = 8;
const POLYGON_MESH: i32 = 16;
const POLYFACE_MESH: i32 = 64;
const VERTEX_3D_POLYLINE: i32 = 32;

/// Parsed DXF drawing
pub struct DxfSource {
    pub drawing: Drawing,
}

/// DXF format reader, ASCII or binary
pub struct DxfFormatReader;

impl FormatReader for DxfFormatReader {
    type Source = DxfSource;

    fn supported_extensions(&self) -> &[&str] {
        &["dxf"]
    }

    fn format_name(&self) -> &str {
        FORMAT
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        FormatValidator::merge_validations(vec![
            FormatValidator::validate_file_exists(path),
            FormatValidator::validate_extension(path, "dxf"),
        ])
    }

    fn read(&self, path: &Path, _cancel: &CancelSignal) -> Result<DxfSource> {
        if !path.is_file() {
            return Err(ShapecadError::InputNotFound { path: path.to_path_buf() });
        }

        let drawing = Drawing::load_file(path)
            .map_err(|e| ShapecadError::unreadable(FORMAT, format!("{}: {}", path.display(), e)))?;

        tracing::debug!(version = ?drawing.header.version, "Loaded DXF drawing");
        Ok(DxfSource { drawing })
    }

    fn classify(&self, source: DxfSource, cancel: &CancelSignal) -> Result<ReadOutput> {
        let drawing = source.drawing;
        let project_name = drawing.header.project_name.trim();
        let mut output = ReadOutput {
            crs_text: if project_name.is_empty() { None } else { Some(project_name.to_string()) },
            version: Some(format!("{:?}", drawing.header.version)),
            ..Default::default()
        };

        for (index, entity) in drawing.entities().enumerate() {
            cancel.check()?;
            classify_entity(index, entity, &mut output);
        }

        Ok(output)
    }
}

/// Upper-case DXF name of an entity type, e.g. `ARC`
fn entity_type_name(specific: &EntityType) -> String {
    let debug = format!("{:?}", specific);
    debug.split(|c: char| !c.is_alphanumeric()).next().unwrap_or_default().to_uppercase()
}

fn classify_entity(index: usize, entity: &Entity, output: &mut ReadOutput) {
    let mut attributes = Attributes::new();
    attributes.insert(LAYER_FIELD.to_string(), serde_json::Value::String(entity.common.layer.clone()));

    let (type_name, classification) = match &entity.specific {
        EntityType::ModelPoint(point) => {
            let location = &point.location;
            let record = GeometryRecord::point(index, Coordinate::with_z(location.x, location.y, location.z));
            output.records.push(record.with_attributes(attributes));
            return;
        }
        EntityType::Line(line) => (
            "LINE",
            Classification::Line(vec![
                Coordinate::with_z(line.p1.x, line.p1.y, line.p1.z),
                Coordinate::with_z(line.p2.x, line.p2.y, line.p2.z),
            ]),
        ),
        EntityType::LwPolyline(poly) => {
            if poly.vertices.iter().any(|v| v.bulge != 0.0) {
                tracing::debug!(index, "Ignoring LWPOLYLINE bulges, arcs become straight segments");
            }
            let vertices = poly
                .vertices
                .iter()
                .map(|v| Coordinate::with_z(v.x, v.y, entity.common.elevation))
                .collect();
            ("LWPOLYLINE", classify_polyline(vertices, poly.is_closed()))
        }
        EntityType::Polyline(poly) => {
            if poly.flags & (POLYGON_MESH | POLYFACE_MESH) != 0 {
                output.skip(index, "POLYLINE", "Polygon and polyface meshes are not supported");
                return;
            }
            let is_3d = poly.flags & POLYLINE_3D != 0;
            let vertices = poly
                .vertices()
                .map(|v| {
                    let z = if is_3d { v.location.z } else { poly.location.z };
                    Coordinate::with_z(v.location.x, v.location.y, z)
                })
                .collect();
            ("POLYLINE", classify_polyline(vertices, poly.is_closed()))
        }
        EntityType::Circle(circle) => {
            let center = Coordinate::with_z(circle.center.x, circle.center.y, circle.center.z);
            match approximate_circle(center, circle.radius) {
                Some(ring) => ("CIRCLE", Classification::Polygon(ring)),
                None => {
                    output.skip(index, "CIRCLE", format!("Invalid radius {}", circle.radius));
                    return;
                }
            }
        }
        other => {
            output.skip(index, entity_type_name(other), "Unsupported entity type");
            return;
        }
    };

    let record = match classification {
        Classification::Line(vertices) => GeometryRecord::line(index, vertices),
        Classification::Polygon(ring) => GeometryRecord::polygon(index, vec![ring]),
        Classification::Degenerate { reason } => {
            output.skip(index, type_name, reason);
            return;
        }
    };
    match record {
        Ok(record) => output.records.push(record.with_attributes(attributes)),
        Err(e) => output.skip(index, type_name, e.to_string()),
    }
}

/// DXF writer for a target release and encoding
pub struct DxfFormatWriter {
    pub version: DxfVersion,
    pub format: DxfFormat,
}

impl DxfFormatWriter {
    pub fn new(version: DxfVersion, format: DxfFormat) -> Self {
        Self { version, format }
    }
}

impl FormatWriter for DxfFormatWriter {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn write(&self, path: &Path, request: &WriteRequest<'_>, cancel: &CancelSignal) -> Result<WriteReport> {
        let mut stage = StagingDir::for_output(path)?;
        let file_name = file_name_of(path)?;
        let staged = stage.stage(&file_name);

        let mut drawing = Drawing::new();
        drawing.header.version = acad_version(self.version);
        if !request.crs.is_unknown() {
            drawing.header.project_name = request.crs.label();
        }

        let layers: BTreeSet<String> = request.records.iter().map(layer_name).collect();
        for name in layers.iter().filter(|n| n.as_str() != "0") {
            let mut layer = dxf::tables::Layer::default();
            layer.name = name.clone();
            drawing.add_layer(layer);
        }

        let mut entity_count = 0;
        for record in request.records {
            cancel.check()?;
            for entity in self.record_entities(&mut drawing, record) {
                drawing.add_entity(entity);
                entity_count += 1;
            }
        }

        let saved = match self.format {
            DxfFormat::Ascii => drawing.save_file(&staged),
            DxfFormat::Binary => drawing.save_file_binary(&staged),
        };
        saved.map_err(|e| ShapecadError::write_failed(path, e.to_string()))?;

        let mut report = WriteReport::default();
        if !self.version.supports_lwpolyline() {
            report.warnings.push(format!("{} has no LWPOLYLINE, wrote POLYLINE entities", self.version));
        }
        if !request.crs.is_unknown() && !self.version.supports_project_name() {
            report.warnings.push(format!(
                "{} has no $PROJECTNAME header, {} is not recorded in the drawing",
                self.version,
                request.crs.label()
            ));
        }
        report.outputs.push(stage.final_path(&file_name));
        stage.commit()?;

        tracing::info!(
            entities = entity_count,
            layers = layers.len(),
            version = %self.version,
            "Wrote DXF drawing"
        );
        Ok(report)
    }
}

impl DxfFormatWriter {
    fn record_entities(&self, drawing: &mut Drawing, record: &GeometryRecord) -> Vec<Entity> {
        let layer = layer_name(record);
        // LWPOLYLINE elevation lives on the common entity data
        let specifics: Vec<(EntityType, f64)> = match record.kind() {
            GeometryKind::Point => {
                let c = record.exterior()[0];
                let mut point = ModelPoint::default();
                point.location = dxf::Point::new(c.x, c.y, c.z_or_zero());
                vec![(EntityType::ModelPoint(point), 0.0)]
            }
            GeometryKind::Line => vec![self.polyline(drawing, record.exterior(), false)],
            // DXF has no holes; every ring becomes its own closed polyline
            GeometryKind::Polygon => record
                .parts()
                .iter()
                .map(|ring| self.polyline(drawing, &ring[..ring.len() - 1], true))
                .collect(),
        };

        specifics
            .into_iter()
            .map(|(specific, elevation)| {
                let mut entity = Entity::new(specific);
                entity.common.layer = layer.clone();
                entity.common.elevation = elevation;
                entity
            })
            .collect()
    }

    /// Polyline entity plus the elevation to set on it, non-zero only for LWPOLYLINE
    fn polyline(&self, drawing: &mut Drawing, vertices: &[Coordinate], closed: bool) -> (EntityType, f64) {
        let elevation = vertices.first().map(Coordinate::z_or_zero).unwrap_or(0.0);
        let planar = vertices.iter().all(|c| c.z_or_zero() == elevation);

        if planar && self.version.supports_lwpolyline() {
            let mut poly = LwPolyline::default();
            poly.vertices = vertices
                .iter()
                .map(|c| LwPolylineVertex { x: c.x, y: c.y, ..Default::default() })
                .collect();
            poly.set_is_closed(closed);
            return (EntityType::LwPolyline(poly), elevation);
        }

        let mut poly = Polyline::default();
        poly.set_is_closed(closed);
        if planar {
            poly.location = dxf::Point::new(0.0, 0.0, elevation);
        } else {
            poly.flags |= POLYLINE_3D;
        }
        for c in vertices {
            let mut vertex = Vertex::new(dxf::Point::new(c.x, c.y, c.z_or_zero()));
            if !planar {
                vertex.flags |= VERTEX_3D_POLYLINE;
            }
            poly.add_vertex(drawing, vertex);
        }
        (EntityType::Polyline(poly), 0.0)
    }
}

fn acad_version(version: DxfVersion) -> AcadVersion {
    match version {
        DxfVersion::R12 => AcadVersion::R12,
        DxfVersion::R2000 => AcadVersion::R2000,
        DxfVersion::R2004 => AcadVersion::R2004,
        DxfVersion::R2007 => AcadVersion::R2007,
        DxfVersion::R2010 => AcadVersion::R2010,
        DxfVersion::R2013 => AcadVersion::R2013,
        DxfVersion::R2018 => AcadVersion::R2018,
    }
}

/// Layer from the `LAYER` attribute, else one layer per geometry kind
fn layer_name(record: &GeometryRecord) -> String {
    let name = match record.attribute_str(LAYER_FIELD).map(str::trim) {
        Some(layer) if !layer.is_empty() => layer.to_string(),
        _ => record.kind().to_string().to_uppercase(),
    };
    sanitize_layer_name(&name)
}

/// Replace characters DXF forbids in symbol table names
fn sanitize_layer_name(name: &str) -> String {
    name.chars()
        .map(|c| if "<>/\\\":;?*|=`".contains(c) || c.is_control() { '_' } else { c })
        .collect()
}
