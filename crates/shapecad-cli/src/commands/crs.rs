//! CRS command implementation

use crate::cli::{CrsArgs, CrsCommand, DetectArgs};
use crate::output::OutputWriter;
use crate::output_types::{CrsRow, DetectOutput};
use anyhow::{Context, Result};
use shapecad_geo::CrsRegistry;
use std::path::Path;

pub fn execute(args: CrsArgs, output: &OutputWriter) -> Result<()> {
    match args.command {
        CrsCommand::List => list(output),
        CrsCommand::Detect(args) => detect(args, output),
    }
}

fn list(output: &OutputWriter) -> Result<()> {
    let rows: Vec<CrsRow> = CrsRegistry::entries().map(|crs| CrsRow::from_descriptor(&crs)).collect();
    output.section("Supported coordinate systems");
    output.table(rows)
}

fn detect(args: DetectArgs, output: &OutputWriter) -> Result<()> {
    // A .prj path is read; anything else is detected as given
    let path = Path::new(&args.input);
    let text = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("prj")) && path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read projection file {}", path.display()))?
    } else {
        args.input.clone()
    };

    let detection = CrsRegistry::detect(&text);
    let result = DetectOutput {
        recognized: detection.is_recognized(),
        crs: detection.crs,
        label: detection.crs.label(),
        warning: detection.warning,
    };

    if output.is_json() {
        return output.result(result);
    }

    if result.recognized {
        output.success(format!("Recognized {}", result.label));
    } else {
        output.kv("Best match", &result.label);
    }
    if let Some(ref warning) = result.warning {
        output.warning(warning);
    }
    Ok(())
}
