//! Conversion pipeline state machine
//!
//! `Idle -> Reading -> Classifying -> ResolvingCrs -> Writing -> Done`, with
//! `Failed` reachable from any non-terminal state. Each call runs its own
//! [`PipelineRun`]; nothing is shared between conversions except the
//! read-only CRS table.

use std::path::Path;

use shapecad_core::error::ShapecadError;
use shapecad_core::models::{
    ConversionConfig, ConversionOutcome, CrsDescriptor, Direction, GeometryRecord, PipelineState,
    SkippedEntity,
};
use shapecad_core::CancelSignal;
use shapecad_formats::{
    DxfFormatReader, DxfFormatWriter, FormatReader, FormatWriter, ReadOutput, ShapefileFormatReader,
    ShapefileFormatWriter, WriteRequest,
};
use shapecad_geo::{validate_record, CrsRegistry};

use crate::error::ConversionError;

type StateObserver = Box<dyn Fn(PipelineState) + Send + Sync>;

/// Progress through the states of one conversion
pub struct PipelineRun<'a> {
    state: PipelineState,
    observer: Option<&'a (dyn Fn(PipelineState) + Send + Sync)>,
}

impl<'a> PipelineRun<'a> {
    fn new(observer: Option<&'a (dyn Fn(PipelineState) + Send + Sync)>) -> Self {
        Self { state: PipelineState::Idle, observer }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to the next state on the success path
    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            tracing::debug!(from = %self.state, to = %next, "Pipeline transition");
            self.state = next;
            if let Some(observer) = self.observer {
                observer(next);
            }
        }
    }

    /// Abort into `Failed`, recording the state the failure came from
    fn fail(&mut self, source: ShapecadError) -> ConversionError {
        let origin = self.state;
        tracing::debug!(state = %origin, error = %source, "Pipeline failed");
        self.state = PipelineState::Failed;
        if let Some(observer) = self.observer {
            observer(PipelineState::Failed);
        }
        ConversionError::new(origin, source)
    }
}

/// Records that survived classification and filtering
struct Classified {
    records: Vec<GeometryRecord>,
    skipped: Vec<SkippedEntity>,
    filtered_count: usize,
    crs_text: Option<String>,
    warnings: Vec<String>,
}

/// Conversion engine entry point
#[derive(Default)]
pub struct Converter {
    observer: Option<StateObserver>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `observer` on every state change
    pub fn with_observer(mut self, observer: impl Fn(PipelineState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Convert `input` to `output` in the direction given by `config`
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        config: &ConversionConfig,
        cancel: &CancelSignal,
    ) -> Result<ConversionOutcome, ConversionError> {
        let mut run = PipelineRun::new(self.observer.as_deref());
        tracing::info!(
            direction = %config.direction,
            input = %input.display(),
            output = %output.display(),
            "Starting conversion"
        );

        let outcome = match config.direction {
            Direction::DxfToShp => self.dxf_to_shp(&mut run, input, output, config, cancel)?,
            Direction::ShpToDxf => self.shp_to_dxf(&mut run, input, output, config, cancel)?,
        };

        tracing::info!(
            converted = outcome.converted_count,
            skipped = outcome.skipped_count(),
            filtered = outcome.filtered_count,
            crs = %outcome.crs,
            has_z = outcome.has_z,
            "Conversion complete"
        );
        Ok(outcome)
    }

    fn dxf_to_shp(
        &self,
        run: &mut PipelineRun<'_>,
        input: &Path,
        output: &Path,
        config: &ConversionConfig,
        cancel: &CancelSignal,
    ) -> Result<ConversionOutcome, ConversionError> {
        let classified = read_and_classify(run, &DxfFormatReader, input, config, cancel)?;

        run.advance(); // ResolvingCrs
        let request = config.crs.ok_or_else(|| {
            run.fail(ShapecadError::UnsupportedCrs {
                reason: "DXF carries no CRS; a datum and MGA zone must be supplied".to_string(),
            })
        })?;
        let crs = CrsRegistry::resolve(request.datum, request.zone).map_err(|e| run.fail(e))?;

        let mut warnings = classified.warnings;
        if let Some(hint) = classified.crs_text.as_deref() {
            let detection = CrsRegistry::detect(hint);
            if detection.is_recognized() && detection.crs != crs {
                warnings.push(format!(
                    "Drawing header names {} but output is written as {}",
                    detection.crs.label(),
                    crs.label()
                ));
            }
        }

        write_and_finish(run, &ShapefileFormatWriter, output, classified.records, crs, cancel).map(
            |(converted_count, has_z, outputs, write_warnings)| {
                warnings.extend(write_warnings);
                ConversionOutcome {
                    direction: Direction::DxfToShp,
                    converted_count,
                    skipped: classified.skipped,
                    filtered_count: classified.filtered_count,
                    crs,
                    has_z,
                    warnings,
                    outputs,
                }
            },
        )
    }

    fn shp_to_dxf(
        &self,
        run: &mut PipelineRun<'_>,
        input: &Path,
        output: &Path,
        config: &ConversionConfig,
        cancel: &CancelSignal,
    ) -> Result<ConversionOutcome, ConversionError> {
        let classified = read_and_classify(run, &ShapefileFormatReader, input, config, cancel)?;

        run.advance(); // ResolvingCrs
        let mut warnings = classified.warnings;
        let crs = detect_source_crs(classified.crs_text.as_deref(), &mut warnings);

        let writer = DxfFormatWriter::new(config.dxf_version, config.dxf_format);
        write_and_finish(run, &writer, output, classified.records, crs, cancel).map(
            |(converted_count, has_z, outputs, write_warnings)| {
                warnings.extend(write_warnings);
                ConversionOutcome {
                    direction: Direction::ShpToDxf,
                    converted_count,
                    skipped: classified.skipped,
                    filtered_count: classified.filtered_count,
                    crs,
                    has_z,
                    warnings,
                    outputs,
                }
            },
        )
    }
}

/// Advisory CRS detection for shapefile input; never fails
pub(crate) fn detect_source_crs(crs_text: Option<&str>, warnings: &mut Vec<String>) -> CrsDescriptor {
    let detection = CrsRegistry::detect(crs_text.unwrap_or_default());
    if let Some(warning) = detection.warning {
        tracing::warn!(%warning, "Source CRS not recognized");
        warnings.push(warning);
    }
    let crs = detection.crs;
    if crs.is_unknown() || (!crs.is_geographic && crs.epsg.is_none()) {
        warnings.push(format!(
            "Source CRS is {}; the DXF will not document its datum",
            crs.label()
        ));
    }
    crs
}

/// `Reading` and `Classifying`: parse the input, then map, validate and filter records
fn read_and_classify<R: FormatReader>(
    run: &mut PipelineRun<'_>,
    reader: &R,
    input: &Path,
    config: &ConversionConfig,
    cancel: &CancelSignal,
) -> Result<Classified, ConversionError> {
    run.advance(); // Reading
    let source = reader.read(input, cancel).map_err(|e| run.fail(e))?;

    run.advance(); // Classifying
    let ReadOutput { records, mut skipped, crs_text, warnings, .. } =
        reader.classify(source, cancel).map_err(|e| run.fail(e))?;

    let mut kept = Vec::with_capacity(records.len());
    let mut filtered_count = 0;
    for record in records {
        let validation = validate_record(&record);
        if let Some(error) = validation.errors.first() {
            tracing::warn!(feature = record.feature_id, reason = %error.reason, "Skipping invalid geometry");
            skipped.push(SkippedEntity {
                index: record.feature_id,
                entity_type: record.kind().to_string(),
                reason: format!("{}: {}", error.location, error.reason),
            });
            continue;
        }
        match config.entity_filter {
            Some(kind) if record.kind() != kind => filtered_count += 1,
            _ => kept.push(record),
        }
    }

    if kept.is_empty() {
        return Err(run.fail(ShapecadError::EmptyResult { skipped: skipped.len() }));
    }

    tracing::debug!(
        records = kept.len(),
        skipped = skipped.len(),
        filtered = filtered_count,
        "Classified {} input",
        reader.format_name()
    );
    Ok(Classified { records: kept, skipped, filtered_count, crs_text, warnings })
}

/// `Writing` and `Done`
fn write_and_finish<W: FormatWriter>(
    run: &mut PipelineRun<'_>,
    writer: &W,
    output: &Path,
    records: Vec<GeometryRecord>,
    crs: CrsDescriptor,
    cancel: &CancelSignal,
) -> Result<(usize, bool, Vec<std::path::PathBuf>, Vec<String>), ConversionError> {
    run.advance(); // Writing
    let has_z = records.iter().any(GeometryRecord::has_z);
    let request = WriteRequest { records: &records, crs: &crs, has_z };
    let report = writer.write(output, &request, cancel).map_err(|e| run.fail(e))?;

    run.advance(); // Done
    Ok((records.len(), has_z, report.outputs, report.warnings))
}

/// Convert with a fresh [`Converter`]
pub fn convert(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cancel: &CancelSignal,
) -> Result<ConversionOutcome, ConversionError> {
    Converter::new().convert(input, output, config, cancel)
}
