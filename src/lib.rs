//! Typed table-column descriptors that turn raw cell text into typed values
//! and back, for tabular import and export.

pub mod check;
pub mod col;
pub mod datetime;
pub mod error;
pub mod settings;

pub use col::{CellFn, CellValue, ColName, ColType, Column, CreationCounter};
pub use error::ConversionError;
