//! Convert command implementation

use crate::cli::{ConvertArgs, DirectionArg};
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use crate::progress::ConversionProgress;
use anyhow::{Context, Result};
use shapecad_core::config::{
    parse_datum, parse_dxf_version, parse_entity_filter, parse_zone, CliConfigOverrides,
};
use shapecad_core::models::{ConversionOutcome, Direction, DxfFormat, GeometryKind};
use shapecad_pipeline::{CancelSignal, Converter};
use std::path::{Path, PathBuf};

pub async fn execute(args: ConvertArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let direction = resolve_direction(&args)?;
    let overrides = overrides_from_args(&args)?;
    let config = load_config_with_overrides(config_path, overrides)?;
    let conversion = config.to_conversion_config(direction);

    if !args.force {
        let existing = existing_outputs(&args.output, direction);
        if !existing.is_empty() {
            return Err(errors::output_exists(&existing).into());
        }
    }

    let progress = ConversionProgress::new(!output.is_json());
    let converter = Converter::new().with_observer(progress.observer());
    let cancel = CancelSignal::new();

    // The engine is synchronous; run it on the blocking pool and watch for Ctrl-C
    let worker_cancel = cancel.clone();
    let (input, target) = (args.input.clone(), args.output.clone());
    let mut task = tokio::task::spawn_blocking(move || {
        converter.convert(&input, &target, &conversion, &worker_cancel)
    });

    let joined = tokio::select! {
        joined = &mut task => joined,
        signal = tokio::signal::ctrl_c() => {
            if signal.is_ok() {
                tracing::warn!("Interrupt received, cancelling conversion");
                cancel.cancel();
            }
            task.await
        }
    };

    match joined.context("Conversion task failed")? {
        Ok(outcome) => {
            progress.finish_success(&format!("Converted {} features", outcome.converted_count));
            report(&outcome, output)
        }
        Err(error) => {
            progress.finish_error(&error.to_string());
            Err(error.into())
        }
    }
}

/// Direction from `--direction`, else from the input and output extensions
fn resolve_direction(args: &ConvertArgs) -> Result<Direction> {
    if let Some(direction) = args.direction {
        return Ok(match direction {
            DirectionArg::DxfToShp => Direction::DxfToShp,
            DirectionArg::ShpToDxf => Direction::ShpToDxf,
        });
    }

    match (extension(&args.input).as_str(), extension(&args.output).as_str()) {
        ("dxf", "shp") => Ok(Direction::DxfToShp),
        ("shp", "dxf") => Ok(Direction::ShpToDxf),
        _ => Err(errors::unknown_direction(
            &args.input.display().to_string(),
            &args.output.display().to_string(),
        )
        .into()),
    }
}

fn extension(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).unwrap_or_default()
}

fn overrides_from_args(args: &ConvertArgs) -> Result<CliConfigOverrides> {
    Ok(CliConfigOverrides {
        datum: args.datum.as_deref().map(parse_datum).transpose()?,
        zone: args.zone.as_deref().map(parse_zone).transpose()?,
        dxf_version: args.dxf_version.as_deref().map(parse_dxf_version).transpose()?,
        dxf_format: args.binary.then_some(DxfFormat::Binary),
        entity_filter: args.only.as_deref().map(parse_entity_filter).transpose()?,
    })
}

/// Files the conversion could replace
fn existing_outputs(output: &Path, direction: Direction) -> Vec<PathBuf> {
    let mut candidates = vec![output.to_path_buf()];

    if direction == Direction::DxfToShp {
        if let Some(stem) = output.file_stem().and_then(|s| s.to_str()) {
            let parent = output.parent().unwrap_or_else(|| Path::new(""));
            candidates.extend(
                GeometryKind::ALL
                    .iter()
                    .map(|kind| parent.join(format!("{}_{}.shp", stem, kind.plural()))),
            );
        }
    }

    candidates.into_iter().filter(|p| p.exists()).collect()
}

fn report(outcome: &ConversionOutcome, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        return output.result(outcome);
    }

    output.success(format!(
        "{}: {} features converted",
        outcome.direction, outcome.converted_count
    ));
    for path in &outcome.outputs {
        output.kv("Output", path.display());
    }
    output.kv("CRS", outcome.crs.label());
    output.kv("Elevation", if outcome.has_z { "preserved" } else { "none" });
    if outcome.filtered_count > 0 {
        output.kv("Filtered out", outcome.filtered_count);
    }

    if !outcome.skipped.is_empty() {
        output.section(format!("Skipped entities ({})", outcome.skipped_count()));
        for skipped in &outcome.skipped {
            output.info(format!("#{} {}: {}", skipped.index, skipped.entity_type, skipped.reason));
        }
    }

    for warning in &outcome.warnings {
        output.warning(warning);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str, output: &str) -> ConvertArgs {
        ConvertArgs {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            direction: None,
            datum: None,
            zone: None,
            only: None,
            dxf_version: None,
            binary: false,
            force: false,
        }
    }

    #[test]
    fn test_direction_from_extensions() {
        assert_eq!(resolve_direction(&args("site.DXF", "site.shp")).unwrap(), Direction::DxfToShp);
        assert_eq!(resolve_direction(&args("lots.shp", "lots.dxf")).unwrap(), Direction::ShpToDxf);
        assert!(resolve_direction(&args("lots.shp", "lots.shp")).is_err());

        let mut explicit = args("drawing.txt", "out");
        explicit.direction = Some(DirectionArg::DxfToShp);
        assert_eq!(resolve_direction(&explicit).unwrap(), Direction::DxfToShp);
    }

    #[test]
    fn test_overrides_from_args() {
        let mut convert = args("a.dxf", "a.shp");
        convert.datum = Some("gda94".into());
        convert.zone = Some("geographic".into());
        convert.only = Some("all".into());
        convert.binary = true;

        let overrides = overrides_from_args(&convert).unwrap();
        assert_eq!(overrides.datum, Some(shapecad_core::models::Datum::Gda1994));
        assert_eq!(overrides.zone, Some(None));
        assert_eq!(overrides.entity_filter, Some(None));
        assert_eq!(overrides.dxf_format, Some(DxfFormat::Binary));
        assert_eq!(overrides.dxf_version, None);

        convert.zone = Some("49".into());
        assert!(overrides_from_args(&convert).is_err());
    }

    #[test]
    fn test_existing_outputs_include_per_kind_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("site.shp");
        std::fs::write(dir.path().join("site_lines.shp"), b"").unwrap();

        assert_eq!(
            existing_outputs(&output, Direction::DxfToShp),
            vec![dir.path().join("site_lines.shp")]
        );
        assert!(existing_outputs(&output, Direction::ShpToDxf).is_empty());
    }
}
