//! Shapefile reader and writer
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The first three must all be present for reading; `.prj` is optional and
//! only feeds CRS detection.

use shapefile::dbase::{
    FieldName, FieldValue as DbaseFieldValue, Reader as DbaseReader, Record, TableWriterBuilder,
};
use shapefile::record::EsriShape;
use shapefile::{
    Multipoint, MultipointZ, Point, PointM, PointZ, Polygon, PolygonRing, PolygonZ,
    Polyline, PolylineZ, Reader as ShapefileReader, Shape, ShapeReader, Writer as ShapefileWriter,
    NO_DATA,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use shapecad_core::error::{Result, ShapecadError};
use shapecad_core::models::{Attributes, Coordinate, GeometryKind, GeometryRecord, MultiGeometry};
use shapecad_core::CancelSignal;
use shapecad_geo::{group_features, orient_for_shapefile, partition_by_kind, shape_layout, ShapeLayout};

use crate::prj;
use crate::staging::{file_name_of, StagingDir};
use crate::validation::{FormatValidation, FormatValidator};
use crate::{FormatReader, FormatWriter, ReadOutput, WriteReport, WriteRequest};

const FORMAT: &str = "Shapefile";

/// Field holding the feature ordinal, always written
pub const ID_FIELD: &str = "ID";
/// Field holding the CAD layer name, always written
pub const LAYER_FIELD: &str = "LAYER";

/// Shapes and DBF records as stored in the file
pub struct ShapefileSource {
    pub shapes: Vec<(Shape, Record)>,
    /// Contents of the `.prj`, if present
    pub prj: Option<String>,
    pub warnings: Vec<String>,
}

/// Shapefile format reader
pub struct ShapefileFormatReader;

impl FormatReader for ShapefileFormatReader {
    type Source = ShapefileSource;

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        FORMAT
    }

    fn validate(&self, path: &Path) -> FormatValidation {
        let extension = FormatValidator::validate_extension(path, "shp");
        if !extension.is_valid() {
            return extension;
        }

        FormatValidator::validate_component_files(path, &["shp", "shx", "dbf"], &["prj"])
    }

    fn read(&self, path: &Path, cancel: &CancelSignal) -> Result<ShapefileSource> {
        let validation = self.validate(path);
        if let Some(missing) = validation.missing.first() {
            return Err(ShapecadError::InputNotFound { path: missing.clone() });
        }
        if !validation.is_valid() {
            return Err(ShapecadError::unreadable(FORMAT, validation.errors.join("; ")));
        }

        let mut reader = open_reader(path)?;

        let mut shapes = Vec::new();
        for result in reader.iter_shapes_and_records() {
            cancel.check()?;
            let pair = result.map_err(|e| {
                ShapecadError::unreadable(FORMAT, format!("Failed to read feature {}: {}", shapes.len(), e))
            })?;
            shapes.push(pair);
        }

        let prj = prj::read_prj(path)?;
        tracing::debug!(features = shapes.len(), has_prj = prj.is_some(), "Read shapefile");
        Ok(ShapefileSource { shapes, prj, warnings: validation.warnings })
    }

    fn classify(&self, source: ShapefileSource, cancel: &CancelSignal) -> Result<ReadOutput> {
        let mut output = ReadOutput { crs_text: source.prj, warnings: source.warnings, ..Default::default() };

        for (index, (shape, record)) in source.shapes.into_iter().enumerate() {
            cancel.check()?;
            let attributes = extract_attributes(record);
            shape_to_records(index, &shape, &attributes, &mut output);
        }

        Ok(output)
    }
}

/// Open the `.shp` with its `.shx` and `.dbf`, located the way validation found them
fn open_reader(path: &Path) -> Result<ShapefileReader<BufReader<File>, BufReader<File>>> {
    let open = |component: &Path| {
        File::open(component).map(BufReader::new).map_err(|e| {
            ShapecadError::unreadable(FORMAT, format!("Failed to open {}: {}", component.display(), e))
        })
    };
    let shx_path = FormatValidator::component_path(path, "shx");
    let dbf_path = FormatValidator::component_path(path, "dbf");

    let shapes = ShapeReader::with_shx(open(path)?, open(shx_path.as_path())?)
        .map_err(|e| ShapecadError::unreadable(FORMAT, format!("Failed to open Shapefile: {}", e)))?;
    let table = DbaseReader::new(open(dbf_path.as_path())?).map_err(|e| {
        ShapecadError::unreadable(FORMAT, format!("Failed to open {}: {}", dbf_path.display(), e))
    })?;
    Ok(ShapefileReader::new(shapes, table))
}

fn xy(p: &Point) -> Coordinate {
    Coordinate::new(p.x, p.y)
}

fn xym(p: &PointM) -> Coordinate {
    Coordinate::new(p.x, p.y)
}

fn xyz(p: &PointZ) -> Coordinate {
    Coordinate::with_z(p.x, p.y, p.z)
}

fn shape_type_name(shape: &Shape) -> &'static str {
    match shape {
        Shape::NullShape => "NullShape",
        Shape::Point(_) => "Point",
        Shape::PointM(_) => "PointM",
        Shape::PointZ(_) => "PointZ",
        Shape::Polyline(_) => "Polyline",
        Shape::PolylineM(_) => "PolylineM",
        Shape::PolylineZ(_) => "PolylineZ",
        Shape::Polygon(_) => "Polygon",
        Shape::PolygonM(_) => "PolygonM",
        Shape::PolygonZ(_) => "PolygonZ",
        Shape::Multipoint(_) => "Multipoint",
        Shape::MultipointM(_) => "MultipointM",
        Shape::MultipointZ(_) => "MultipointZ",
        Shape::Multipatch(_) => "Multipatch",
    }
}

/// Split one shape into neutral records; multi-part shapes yield one record per part
fn shape_to_records(index: usize, shape: &Shape, attributes: &Attributes, output: &mut ReadOutput) {
    let type_name = shape_type_name(shape);
    match shape {
        Shape::Point(p) => push_points(index, vec![xy(p)], attributes, output),
        Shape::PointM(p) => push_points(index, vec![xym(p)], attributes, output),
        Shape::PointZ(p) => push_points(index, vec![xyz(p)], attributes, output),
        Shape::Multipoint(mp) => push_points(index, mp.points().iter().map(xy).collect(), attributes, output),
        Shape::MultipointM(mp) => push_points(index, mp.points().iter().map(xym).collect(), attributes, output),
        Shape::MultipointZ(mp) => push_points(index, mp.points().iter().map(xyz).collect(), attributes, output),
        Shape::Polyline(pl) => {
            let parts = pl.parts().iter().map(|part| part.iter().map(xy).collect()).collect();
            push_lines(index, type_name, parts, attributes, output)
        }
        Shape::PolylineM(pl) => {
            let parts = pl.parts().iter().map(|part| part.iter().map(xym).collect()).collect();
            push_lines(index, type_name, parts, attributes, output)
        }
        Shape::PolylineZ(pl) => {
            let parts = pl.parts().iter().map(|part| part.iter().map(xyz).collect()).collect();
            push_lines(index, type_name, parts, attributes, output)
        }
        Shape::Polygon(pg) => {
            let rings = pg
                .rings()
                .iter()
                .map(|r| (matches!(r, PolygonRing::Outer(_)), r.points().iter().map(xy).collect()))
                .collect();
            push_polygons(index, type_name, rings, attributes, output)
        }
        Shape::PolygonM(pg) => {
            let rings = pg
                .rings()
                .iter()
                .map(|r| (matches!(r, PolygonRing::Outer(_)), r.points().iter().map(xym).collect()))
                .collect();
            push_polygons(index, type_name, rings, attributes, output)
        }
        Shape::PolygonZ(pg) => {
            let rings = pg
                .rings()
                .iter()
                .map(|r| (matches!(r, PolygonRing::Outer(_)), r.points().iter().map(xyz).collect()))
                .collect();
            push_polygons(index, type_name, rings, attributes, output)
        }
        Shape::Multipatch(_) => {
            output.skip(index, type_name, "Multipatch surfaces have no point/line/polygon equivalent")
        }
        Shape::NullShape => output.skip(index, type_name, "Shape has no geometry"),
    }
}

fn push_points(index: usize, points: Vec<Coordinate>, attributes: &Attributes, output: &mut ReadOutput) {
    if points.is_empty() {
        output.skip(index, "Multipoint", "Multipoint has no points");
        return;
    }
    for point in points {
        output.records.push(GeometryRecord::point(index, point).with_attributes(attributes.clone()));
    }
}

fn push_lines(
    index: usize,
    type_name: &str,
    parts: Vec<Vec<Coordinate>>,
    attributes: &Attributes,
    output: &mut ReadOutput,
) {
    let before = output.records.len();
    for part in parts {
        match GeometryRecord::line(index, part) {
            Ok(record) => output.records.push(record.with_attributes(attributes.clone())),
            Err(e) => tracing::warn!(index, error = %e, "Dropping degenerate polyline part"),
        }
    }
    if output.records.len() == before {
        output.skip(index, type_name, "No polyline part has 2 or more vertices");
    }
}

/// Group rings into polygons: each outer ring starts a polygon, inner rings
/// attach to the most recent outer ring
fn push_polygons(
    index: usize,
    type_name: &str,
    rings: Vec<(bool, Vec<Coordinate>)>,
    attributes: &Attributes,
    output: &mut ReadOutput,
) {
    let mut polygons: Vec<Vec<Vec<Coordinate>>> = Vec::new();
    for (is_outer, ring) in rings {
        match polygons.last_mut() {
            Some(current) if !is_outer => current.push(ring),
            None if !is_outer => {
                tracing::warn!(index, "Hole ring without an outer ring, treating it as outer");
                polygons.push(vec![ring]);
            }
            _ => polygons.push(vec![ring]),
        }
    }

    let before = output.records.len();
    for rings in polygons {
        match GeometryRecord::polygon(index, rings) {
            Ok(record) => output.records.push(record.with_attributes(attributes.clone())),
            Err(e) => tracing::warn!(index, error = %e, "Dropping malformed polygon part"),
        }
    }
    if output.records.len() == before {
        output.skip(index, type_name, "No polygon part has a valid closed ring");
    }
}

/// Extract attributes from a DBF record
fn extract_attributes(record: Record) -> Attributes {
    record
        .into_iter()
        .map(|(name, value)| (name.trim().to_string(), convert_dbase_value(&value)))
        .collect()
}

fn number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Convert dBase field value to JSON value
#[allow(unreachable_patterns)]
fn convert_dbase_value(value: &DbaseFieldValue) -> serde_json::Value {
    match value {
        DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s.trim_end().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => {
            serde_json::Value::String(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
        }
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Integer(i) => serde_json::Value::Number((*i).into()),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::DateTime(dt) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Memo(s) => serde_json::Value::String(s.clone()),
        _ => serde_json::Value::Null,
    }
}

/// Shapefile writer: one layer per geometry kind, `.prj` from the CRS
pub struct ShapefileFormatWriter;

impl FormatWriter for ShapefileFormatWriter {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn write(&self, path: &Path, request: &WriteRequest<'_>, cancel: &CancelSignal) -> Result<WriteReport> {
        let path = path.with_extension("shp");
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ShapecadError::write_failed(&path, "output path has no file name"))?
            .to_string();

        let layers = partition_by_kind(request.records.to_vec());
        let mixed = layers.len() > 1;

        let mut stage = StagingDir::for_output(&path)?;
        let mut report = WriteReport::default();

        for (kind, records) in layers {
            let file_name = if mixed {
                format!("{}_{}.shp", stem, kind.plural())
            } else {
                file_name_of(&path)?
            };
            let shp_path = stage.stage(&file_name);
            for ext in ["shx", "dbf", "prj"] {
                stage.stage(&file_name_with_extension(&file_name, ext));
            }

            let features = group_features(records)?;
            write_layer(&shp_path, kind, &features, request.has_z, cancel)?;

            if !prj::write_prj(&shp_path.with_extension("prj"), request.crs)? {
                report.warnings.push(format!("{}: CRS unknown, no .prj written", file_name));
            }

            tracing::info!(layer = %file_name, kind = %kind, features = features.len(), "Wrote shapefile layer");
            report.outputs.push(stage.final_path(&file_name));
        }

        stage.commit()?;
        Ok(report)
    }
}

fn file_name_with_extension(file_name: &str, ext: &str) -> String {
    PathBuf::from(file_name).with_extension(ext).to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind {
    Character,
    Numeric,
    Logical,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    /// Attribute key the values come from
    source: String,
    /// dBase field name, at most 10 characters
    name: String,
    kind: FieldKind,
}

/// Passthrough fields, derived from the attributes present on the features
fn attribute_fields(features: &[MultiGeometry]) -> Vec<FieldSpec> {
    let mut fields: Vec<FieldSpec> = Vec::new();
    let mut taken: BTreeSet<String> = [ID_FIELD, LAYER_FIELD].iter().map(|s| s.to_string()).collect();

    for feature in features {
        for (key, value) in feature.attributes() {
            if fields.iter().any(|f| &f.source == key) {
                continue;
            }
            let kind = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::Bool(_) => FieldKind::Logical,
                serde_json::Value::Number(_) => FieldKind::Numeric,
                _ => FieldKind::Character,
            };
            let name: String = key.chars().filter(|c| c.is_ascii_graphic()).take(10).collect();
            if name.is_empty() || !taken.insert(name.to_uppercase()) {
                tracing::debug!(attribute = %key, "Attribute has no usable dBase field name, dropping");
                continue;
            }
            fields.push(FieldSpec { source: key.clone(), name, kind });
        }
    }
    fields
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|e| ShapecadError::write_failed(name, format!("invalid field name: {:?}", e)))
}

fn table_builder(fields: &[FieldSpec]) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new()
        .add_numeric_field(field_name(ID_FIELD)?, 10, 0)
        .add_character_field(field_name(LAYER_FIELD)?, 254);
    for field in fields {
        let name = field_name(&field.name)?;
        builder = match field.kind {
            FieldKind::Character => builder.add_character_field(name, 254),
            FieldKind::Numeric => builder.add_numeric_field(name, 18, 6),
            FieldKind::Logical => builder.add_logical_field(name),
        };
    }
    Ok(builder)
}

fn build_record(ordinal: usize, feature: &MultiGeometry, fields: &[FieldSpec]) -> Record {
    let attributes = feature.attributes();
    let mut record = Record::default();
    record.insert(ID_FIELD.to_string(), DbaseFieldValue::Numeric(Some(ordinal as f64)));
    record.insert(
        LAYER_FIELD.to_string(),
        DbaseFieldValue::Character(attributes.get(LAYER_FIELD).and_then(|v| v.as_str()).map(str::to_string)),
    );

    for field in fields {
        let value = attributes.get(&field.source);
        let field_value = match field.kind {
            FieldKind::Numeric => DbaseFieldValue::Numeric(value.and_then(|v| v.as_f64())),
            FieldKind::Logical => DbaseFieldValue::Logical(value.and_then(|v| v.as_bool())),
            FieldKind::Character => DbaseFieldValue::Character(value.and_then(|v| match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })),
        };
        record.insert(field.name.clone(), field_value);
    }
    record
}

fn write_layer(
    path: &Path,
    kind: GeometryKind,
    features: &[MultiGeometry],
    has_z: bool,
    cancel: &CancelSignal,
) -> Result<()> {
    let fields = attribute_fields(features);
    let table = table_builder(&fields)?;
    let layout = shape_layout(kind, features);

    let mut shapes = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        shapes.push((feature, build_record(i + 1, feature, &fields)));
    }

    match (layout, has_z) {
        (ShapeLayout::Point, false) => write_shapes(path, table, &shapes, |f| xy_point(&f.members()[0].exterior()[0]), cancel),
        (ShapeLayout::Point, true) => write_shapes(path, table, &shapes, |f| z_point(&f.members()[0].exterior()[0]), cancel),
        (ShapeLayout::Multipoint, false) => write_shapes(
            path,
            table,
            &shapes,
            |f| Multipoint::new(f.members().iter().map(|m| xy_point(&m.exterior()[0])).collect()),
            cancel,
        ),
        (ShapeLayout::Multipoint, true) => write_shapes(
            path,
            table,
            &shapes,
            |f| MultipointZ::new(f.members().iter().map(|m| z_point(&m.exterior()[0])).collect()),
            cancel,
        ),
        (ShapeLayout::Polyline, false) => write_shapes(
            path,
            table,
            &shapes,
            |f| Polyline::with_parts(f.members().iter().map(|m| m.exterior().iter().map(xy_point).collect()).collect()),
            cancel,
        ),
        (ShapeLayout::Polyline, true) => write_shapes(
            path,
            table,
            &shapes,
            |f| PolylineZ::with_parts(f.members().iter().map(|m| m.exterior().iter().map(z_point).collect()).collect()),
            cancel,
        ),
        (ShapeLayout::Polygon, false) => {
            write_shapes(path, table, &shapes, |f| Polygon::with_rings(polygon_rings(f, xy_point)), cancel)
        }
        (ShapeLayout::Polygon, true) => {
            write_shapes(path, table, &shapes, |f| PolygonZ::with_rings(polygon_rings(f, z_point)), cancel)
        }
    }
}

fn xy_point(c: &Coordinate) -> Point {
    Point::new(c.x, c.y)
}

fn z_point(c: &Coordinate) -> PointZ {
    PointZ::new(c.x, c.y, c.z_or_zero(), NO_DATA)
}

/// Rings of every member, oriented outer clockwise and holes counter-clockwise
fn polygon_rings<P>(feature: &MultiGeometry, convert: fn(&Coordinate) -> P) -> Vec<PolygonRing<P>> {
    let mut out = Vec::new();
    for member in feature.members() {
        let mut rings = member.parts().to_vec();
        orient_for_shapefile(&mut rings);
        for (i, ring) in rings.iter().enumerate() {
            let points = ring.iter().map(convert).collect();
            out.push(if i == 0 { PolygonRing::Outer(points) } else { PolygonRing::Inner(points) });
        }
    }
    out
}

fn write_shapes<S, F>(
    path: &Path,
    table: TableWriterBuilder,
    shapes: &[(&MultiGeometry, Record)],
    to_shape: F,
    cancel: &CancelSignal,
) -> Result<()>
where
    S: EsriShape,
    F: Fn(&MultiGeometry) -> S,
{
    let mut writer = ShapefileWriter::from_path(path, table)
        .map_err(|e| ShapecadError::write_failed(path, e.to_string()))?;
    for (feature, record) in shapes {
        cancel.check()?;
        writer
            .write_shape_and_record(&to_shape(feature), record)
            .map_err(|e| ShapecadError::write_failed(path, e.to_string()))?;
    }
    Ok(())
}
