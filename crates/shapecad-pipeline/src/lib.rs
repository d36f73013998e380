//! ShapeCAD Pipeline - conversion orchestration
//!
//! Drives a reader, the CRS registry and a writer through the conversion
//! states, and exposes the read-only analysis entry points.

pub mod analyze;
pub mod error;
pub mod pipeline;

pub use analyze::{analyze, analyze_dxf};
pub use error::ConversionError;
pub use pipeline::{convert, Converter, PipelineRun};
pub use shapecad_core::CancelSignal;
