//! Conversion failure reported by the pipeline

use thiserror::Error;

use shapecad_core::error::{ErrorKind, ShapecadError};
use shapecad_core::models::PipelineState;

/// A structural failure that aborted a conversion, tagged with the state it
/// originated in
#[derive(Debug, Error)]
#[error("Conversion failed during {state}: {source}")]
pub struct ConversionError {
    pub state: PipelineState,
    pub source: ShapecadError,
}

impl ConversionError {
    pub fn new(state: PipelineState, source: ShapecadError) -> Self {
        Self { state, source }
    }

    /// Error kind; plain I/O failures while writing count as `WriteFailed`
    pub fn kind(&self) -> ErrorKind {
        match (&self.source, self.state) {
            (ShapecadError::Io(_), PipelineState::Writing) => ErrorKind::WriteFailed,
            (source, _) => source.kind(),
        }
    }
}
