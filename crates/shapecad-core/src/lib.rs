//! ShapeCAD Core - Domain models, errors, and configuration
//!
//! This crate contains the format-neutral geometry model, the CRS descriptor,
//! the conversion configuration and outcome types shared by every other
//! ShapeCAD crate.

pub mod cancel;
pub mod config;
pub mod error;
pub mod models;

pub use cancel::CancelSignal;
pub use error::{ErrorKind, Result, ShapecadError};
