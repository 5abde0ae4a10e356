use thiserror::Error;

use crate::col::ColType;

/// Raised when a non-empty cell string cannot be coerced into its column's type.
///
/// Column descriptors never recover from this themselves; the caller (an
/// importer, the schema check) decides whether to skip the row, abort, or
/// report the cell.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot convert {input:?} to {target}: {reason}")]
pub struct ConversionError {
    pub target: ColType,
    pub input: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(target: ColType, input: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            target,
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}
