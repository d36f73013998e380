use std::path::{Path, PathBuf};

use dxf::entities::{Circle, Entity, EntityType, Line, LwPolyline, Text};
use dxf::enums::AcadVersion;
use dxf::{Drawing, LwPolylineVertex};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PointZ, Polygon, PolygonRing, Shape};
use tempfile::TempDir;

use shapecad_core::models::{
    ConversionConfig, CrsRequest, Datum, Direction, DxfFormat, GeometryKind, PipelineState,
};
use shapecad_core::ErrorKind;
use shapecad_pipeline::{analyze, analyze_dxf, convert, CancelSignal, Converter};

fn write_dxf(dir: &TempDir, name: &str, entities: Vec<EntityType>) -> PathBuf {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2018;
    for specific in entities {
        drawing.add_entity(Entity::new(specific));
    }
    let path = dir.path().join(name);
    drawing.save_file(&path).unwrap();
    path
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> EntityType {
    EntityType::Line(Line::new(dxf::Point::new(x1, y1, 0.0), dxf::Point::new(x2, y2, 0.0)))
}

fn closed_square() -> EntityType {
    let mut poly = LwPolyline::default();
    poly.vertices = [(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]
        .iter()
        .map(|&(x, y)| LwPolylineVertex { x, y, ..Default::default() })
        .collect();
    poly.set_is_closed(true);
    EntityType::LwPolyline(poly)
}

fn circle(x: f64, y: f64, radius: f64) -> EntityType {
    let mut circle = Circle::default();
    circle.center = dxf::Point::new(x, y, 0.0);
    circle.radius = radius;
    EntityType::Circle(circle)
}

fn sample_dxf(dir: &TempDir) -> PathBuf {
    write_dxf(dir, "site.dxf", vec![line(0.0, 0.0, 10.0, 0.0), closed_square(), circle(5.0, 5.0, 2.0)])
}

fn gda94_zone50() -> ConversionConfig {
    ConversionConfig::dxf_to_shp(CrsRequest::mga(Datum::Gda1994, 50))
}

fn read_shapes(path: &Path) -> Vec<Shape> {
    shapefile::read_shapes(path).unwrap()
}

fn clockwise_square() -> Vec<Point> {
    vec![
        Point::new(100.0, 100.0),
        Point::new(100.0, 200.0),
        Point::new(200.0, 200.0),
        Point::new(200.0, 100.0),
        Point::new(100.0, 100.0),
    ]
}

fn write_polygon_shp(dir: &TempDir, name: &str, prj: Option<&str>) -> PathBuf {
    let path = dir.path().join(name);
    let table = TableWriterBuilder::new().add_character_field(FieldName::try_from("NAME").unwrap(), 20);
    let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

    let polygon = Polygon::new(PolygonRing::Outer(clockwise_square()));
    let mut record = Record::default();
    record.insert("NAME".to_string(), FieldValue::Character(Some("Lot 1".to_string())));
    writer.write_shape_and_record(&polygon, &record).unwrap();
    drop(writer);

    if let Some(prj) = prj {
        std::fs::write(path.with_extension("prj"), prj).unwrap();
    }
    path
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_dxf_to_shp_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);
    let output = dir.path().join("site.shp");

    let outcome = convert(&input, &output, &gda94_zone50(), &CancelSignal::new()).unwrap();

    assert_eq!(outcome.direction, Direction::DxfToShp);
    assert_eq!(outcome.converted_count, 3);
    assert_eq!(outcome.skipped_count(), 0);
    assert_eq!(outcome.filtered_count, 0);
    assert_eq!(outcome.crs.epsg, Some(28350));
    assert!(!outcome.has_z);

    let lines_path = dir.path().join("site_lines.shp");
    let polygons_path = dir.path().join("site_polygons.shp");
    assert_eq!(outcome.outputs, vec![lines_path.clone(), polygons_path.clone()]);

    let lines = read_shapes(&lines_path);
    assert_eq!(lines.len(), 1);
    match &lines[0] {
        Shape::Polyline(polyline) => {
            assert_eq!(polyline.parts().len(), 1);
            assert_eq!(polyline.parts()[0].len(), 2);
        }
        other => panic!("expected a polyline, got {:?}", other.shapetype()),
    }

    let polygons = read_shapes(&polygons_path);
    assert_eq!(polygons.len(), 2);
    let ring_sizes: Vec<usize> = polygons
        .iter()
        .map(|shape| match shape {
            Shape::Polygon(polygon) => {
                assert_eq!(polygon.rings().len(), 1);
                polygon.rings()[0].points().len()
            }
            other => panic!("expected a polygon, got {:?}", other.shapetype()),
        })
        .collect();
    assert_eq!(ring_sizes, vec![5, 37]);

    let prj = std::fs::read_to_string(polygons_path.with_extension("prj")).unwrap();
    assert!(prj.contains("GDA_1994_MGA_Zone_50"));
}

#[test]
fn test_entity_filter_writes_single_layer_at_output_path() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);
    let output = dir.path().join("polygons.shp");

    let config = gda94_zone50().with_filter(GeometryKind::Polygon);
    let outcome = convert(&input, &output, &config, &CancelSignal::new()).unwrap();

    assert_eq!(outcome.converted_count, 2);
    assert_eq!(outcome.filtered_count, 1);
    assert_eq!(outcome.skipped_count(), 0);
    assert_eq!(outcome.outputs, vec![output.clone()]);
    assert_eq!(read_shapes(&output).len(), 2);
}

#[test]
fn test_unsupported_entities_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let mut text = Text::default();
    text.value = "LOT 12".to_string();
    let input = write_dxf(&dir, "mixed.dxf", vec![EntityType::Text(text), line(0.0, 0.0, 1.0, 1.0)]);

    let outcome =
        convert(&input, &dir.path().join("out.shp"), &gda94_zone50(), &CancelSignal::new()).unwrap();

    assert_eq!(outcome.converted_count, 1);
    assert_eq!(outcome.skipped_count(), 1);
    assert_eq!(outcome.skipped[0].entity_type, "TEXT");
}

#[test]
fn test_empty_result() {
    let dir = TempDir::new().unwrap();
    let input = write_dxf(&dir, "text_only.dxf", vec![EntityType::Text(Text::default())]);

    let err = convert(&input, &dir.path().join("out.shp"), &gda94_zone50(), &CancelSignal::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyResult);
    assert_eq!(err.state, PipelineState::Classifying);
    assert!(!dir.path().join("out.shp").exists());
}

#[test]
fn test_invalid_zone_fails_while_resolving_crs() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);
    let config = ConversionConfig::dxf_to_shp(CrsRequest::mga(Datum::Gda1994, 49));

    let err = convert(&input, &dir.path().join("out.shp"), &config, &CancelSignal::new()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedCrs);
    assert_eq!(err.state, PipelineState::ResolvingCrs);
}

#[test]
fn test_missing_crs_for_dxf_input() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);
    let mut config = gda94_zone50();
    config.crs = None;

    let err = convert(&input, &dir.path().join("out.shp"), &config, &CancelSignal::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCrs);
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = convert(
        &dir.path().join("absent.shp"),
        &dir.path().join("out.dxf"),
        &ConversionConfig::shp_to_dxf(),
        &CancelSignal::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
    assert_eq!(err.state, PipelineState::Reading);
}

#[test]
fn test_polygon_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.shp", None);
    let dxf_path = dir.path().join("lots.dxf");
    let back = dir.path().join("lots_back.shp");

    let outcome = convert(&source, &dxf_path, &ConversionConfig::shp_to_dxf(), &CancelSignal::new()).unwrap();
    assert_eq!(outcome.converted_count, 1);
    assert!(outcome.crs.is_unknown());
    assert!(!outcome.warnings.is_empty());

    let outcome = convert(&dxf_path, &back, &gda94_zone50(), &CancelSignal::new()).unwrap();
    assert_eq!(outcome.outputs, vec![back.clone()]);

    let shapes = read_shapes(&back);
    assert_eq!(shapes.len(), 1);
    match &shapes[0] {
        Shape::Polygon(polygon) => {
            let ring = polygon.rings()[0].points();
            assert_eq!(ring, &clockwise_square()[..]);
        }
        other => panic!("expected a polygon, got {:?}", other.shapetype()),
    }
}

#[test]
fn test_shp_to_dxf_detects_crs_and_writes_hint() {
    let dir = TempDir::new().unwrap();
    let prj = r#"PROJCS["GDA2020_MGA_Zone_55",GEOGCS["GCS_GDA2020",DATUM["D_GDA2020",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",10000000.0],PARAMETER["Central_Meridian",147.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;
    let source = write_polygon_shp(&dir, "lots.shp", Some(prj));
    let dxf_path = dir.path().join("lots.dxf");

    let outcome = convert(&source, &dxf_path, &ConversionConfig::shp_to_dxf(), &CancelSignal::new()).unwrap();
    assert_eq!(outcome.crs.epsg, Some(7855));
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let analysis = analyze_dxf(&dxf_path).unwrap();
    assert_eq!(analysis.polygon_count, 1);
    assert_eq!(analysis.crs_hint.and_then(|crs| crs.epsg), Some(7855));

    // Converting back with a different CRS keeps the configured one but warns
    let outcome = convert(&dxf_path, &dir.path().join("back.shp"), &gda94_zone50(), &CancelSignal::new())
        .unwrap();
    assert_eq!(outcome.crs.epsg, Some(28350));
    assert!(outcome.warnings.iter().any(|w| w.contains("EPSG:7855")));
}

#[test]
fn test_elevation_survives_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("levels.shp");
    let table = TableWriterBuilder::new().add_numeric_field(FieldName::try_from("RL").unwrap(), 10, 3);
    let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
    for (i, z) in [12.5, 14.0].iter().enumerate() {
        let mut record = Record::default();
        record.insert("RL".to_string(), FieldValue::Numeric(Some(*z)));
        writer
            .write_shape_and_record(&PointZ::new(i as f64, 0.0, *z, shapefile::NO_DATA), &record)
            .unwrap();
    }
    drop(writer);

    let dxf_path = dir.path().join("levels.dxf");
    let outcome = convert(&path, &dxf_path, &ConversionConfig::shp_to_dxf(), &CancelSignal::new()).unwrap();
    assert!(outcome.has_z);

    let back = dir.path().join("levels_back.shp");
    let outcome = convert(&dxf_path, &back, &gda94_zone50(), &CancelSignal::new()).unwrap();
    assert!(outcome.has_z);

    let shapes = read_shapes(&back);
    let zs: Vec<f64> = shapes
        .iter()
        .map(|shape| match shape {
            Shape::PointZ(point) => point.z,
            other => panic!("expected PointZ, got {:?}", other.shapetype()),
        })
        .collect();
    assert_eq!(zs, vec![12.5, 14.0]);
}

#[test]
fn test_binary_dxf_output() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.shp", None);
    let dxf_path = dir.path().join("lots.dxf");
    let config = ConversionConfig::shp_to_dxf().with_dxf_format(DxfFormat::Binary);

    convert(&source, &dxf_path, &config, &CancelSignal::new()).unwrap();

    let bytes = std::fs::read(&dxf_path).unwrap();
    assert!(bytes.starts_with(b"AutoCAD Binary DXF"));
}

#[test]
fn test_cancel_while_writing_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);
    let output = dir.path().join("cancelled.shp");

    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    let converter = Converter::new().with_observer(move |state| {
        if state == PipelineState::Writing {
            trigger.cancel();
        }
    });

    let err = converter.convert(&input, &output, &gda94_zone50(), &cancel).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.state, PipelineState::Writing);
    assert_eq!(dir_entries(&dir), vec!["site.dxf".to_string()]);
}

#[test]
fn test_cancel_before_start() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.shp", None);
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = convert(&source, &dir.path().join("out.dxf"), &ConversionConfig::shp_to_dxf(), &cancel)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.state, PipelineState::Reading);
    assert!(!dir.path().join("out.dxf").exists());
}

#[test]
fn test_analyze_shapefile() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.shp", Some("EPSG:28356"));

    let analysis = analyze(&source).unwrap();
    assert_eq!(analysis.geometry_kind, Some(GeometryKind::Polygon));
    assert_eq!(analysis.crs.epsg, Some(28356));
    assert!(analysis.crs_warning.is_none());
    assert!(!analysis.has_z);
    assert_eq!(analysis.feature_count, 1);
}

#[test]
fn test_analyze_shapefile_without_prj() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.shp", None);

    let analysis = analyze(&source).unwrap();
    assert!(analysis.crs.is_unknown());
    assert!(analysis.crs_warning.is_some());
}

#[test]
fn test_dotted_shapefile_name() {
    let dir = TempDir::new().unwrap();
    let source = write_polygon_shp(&dir, "lots.v2.shp", Some("EPSG:28356"));

    let analysis = analyze(&source).unwrap();
    assert_eq!(analysis.feature_count, 1);
    assert_eq!(analysis.crs.epsg, Some(28356));

    let dxf_path = dir.path().join("lots.v2.dxf");
    let outcome = convert(&source, &dxf_path, &ConversionConfig::shp_to_dxf(), &CancelSignal::new()).unwrap();
    assert_eq!(outcome.converted_count, 1);
    assert_eq!(outcome.outputs, vec![dxf_path]);
}

#[test]
fn test_analyze_dxf_counts() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);

    let analysis = analyze_dxf(&input).unwrap();
    assert_eq!(analysis.line_count, 1);
    assert_eq!(analysis.polygon_count, 2);
    assert_eq!(analysis.point_count, 0);
    assert!(analysis.skipped.is_empty());
    assert!(analysis.crs_hint.is_none());
    assert!(!analysis.version.is_empty());
}

#[test]
fn test_concurrent_conversions_are_independent() {
    let dir = TempDir::new().unwrap();
    let input = sample_dxf(&dir);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let input = input.clone();
            let output = dir.path().join(format!("parallel_{}.shp", i));
            std::thread::spawn(move || {
                let config = gda94_zone50().with_filter(GeometryKind::Line);
                convert(&input, &output, &config, &CancelSignal::new()).map(|o| o.converted_count)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}
