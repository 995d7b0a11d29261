//! Unified error types for sparse tensor formats
//!
//! This module provides the error types shared by the COO container and the
//! CSF builder.
//!
//! # Design
//!
//! - **`ValidationError`**: what is wrong with a COO input (shape, lengths,
//!   coordinate range, ordering)
//! - **Format-specific errors**: [`CooError`](crate::coo::CooError) and
//!   `CsfError` (behind the `csf` feature)
//! - **`SparseError`**: top-level enum that every format error converts into;
//!   CSF input errors surface as `SparseError::Validation`
//!
//! # Examples
//!
//! ```
//! use csfkit_sparse::error::{SparseError, ValidationError};
//!
//! fn validate_shape(shape: &[usize]) -> Result<(), SparseError> {
//!     if shape.is_empty() {
//!         return Err(SparseError::Validation(ValidationError::EmptyShape));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_shape(&[]).is_err());
//! assert!(validate_shape(&[2, 3]).is_ok());
//! ```

use thiserror::Error;

/// Top-level error type for all sparse tensor operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// Validation errors (shape, coordinates, ordering)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// COO format errors
    #[error("COO error: {0}")]
    Coo(#[from] crate::coo::CooError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Validation errors for a coordinate-form input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Shape cannot be empty")]
    EmptyShape,

    #[error("Shape dimensions must match: expected {expected}, got {got}")]
    ShapeDimsMismatch { expected: usize, got: usize },

    #[error("Mode {mode} has {coords} coordinates but there are {values} values")]
    LengthMismatch {
        mode: usize,
        coords: usize,
        values: usize,
    },

    #[error(
        "Coordinate {coord} at position {position} is out of bounds for mode {mode} (extent {extent})"
    )]
    CoordinateOutOfBounds {
        position: usize,
        mode: usize,
        coord: usize,
        extent: usize,
    },

    #[error("Unsorted indices at position {position}")]
    UnsortedIndices { position: usize },
}

#[cfg(feature = "csf")]
impl From<crate::csf::CsfError> for SparseError {
    fn from(err: crate::csf::CsfError) -> Self {
        match err {
            crate::csf::CsfError::InvalidInput(inner) => SparseError::Validation(inner),
            other => SparseError::Other(other.to_string()),
        }
    }
}

/// Result type alias for sparse tensor operations
pub type SparseResult<T> = Result<T, SparseError>;
