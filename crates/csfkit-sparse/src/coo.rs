//! COO (Coordinate) sparse tensor format
//!
//! The Coordinate format stores an N-dimensional sparse tensor as one value per
//! nonzero plus one coordinate buffer per mode. It is the input of the CSF
//! builder and the common intermediate for conversions.
//!
//! # Format
//!
//! For an N-dimensional sparse tensor with `nnz` nonzeros:
//! - `coords`: `Vec<Vec<usize>>` - `coords[m][i]` is the mode-`m` coordinate of entry `i`
//! - `values`: `Vec<T>` - The non-zero values, `values[i]` belongs to entry `i`
//! - `shape`: `Vec<usize>` - The shape of the tensor
//!
//! Coordinates are stored mode-major so that a single mode can be scanned as a
//! contiguous buffer, which is what the CSF builder does level by level.
//!
//! # Examples
//!
//! ```
//! use csfkit_sparse::coo::CooTensor;
//!
//! // A 3x4 sparse matrix with 3 non-zero elements: (0,1), (1,2), (2,0)
//! let coords = vec![
//!     vec![0, 1, 2], // mode 0
//!     vec![1, 2, 0], // mode 1
//! ];
//! let values = vec![2.5, 3.0, 1.5];
//! let shape = vec![3, 4];
//!
//! let coo = CooTensor::new(coords, values, shape).unwrap();
//! assert_eq!(coo.nnz(), 3);
//! assert_eq!(coo.shape(), &[3, 4]);
//! assert!(coo.is_sorted());
//! ```
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use std::cmp::Ordering;

use scirs2_core::ndarray_ext::{ArrayD, Dimension};
use scirs2_core::numeric::Float;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CooError {
    #[error("Shape mismatch: {coords_len} coordinate buffers but shape has {shape_len} dimensions")]
    ShapeMismatch { coords_len: usize, shape_len: usize },

    #[error("Length mismatch: mode {mode} has {coords} coordinates but there are {values} values")]
    LengthMismatch {
        mode: usize,
        coords: usize,
        values: usize,
    },

    #[error("Index out of bounds: index {index:?} exceeds shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

/// Read-only view of a coordinate-form sparse tensor.
///
/// This is everything the CSF builder needs from its input. Any container that
/// keeps one dense coordinate buffer per mode can implement it without copying.
pub trait CooSource<T> {
    /// Shape of the tensor, one extent per mode.
    fn shape(&self) -> &[usize];

    /// Stored values, one per nonzero.
    fn data(&self) -> &[T];

    /// Coordinate buffer of `mode`, one entry per nonzero.
    ///
    /// Only called with `mode < self.ndim()`.
    fn coords(&self, mode: usize) -> &[usize];

    /// Number of modes.
    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of stored entries.
    fn nnz(&self) -> usize {
        self.data().len()
    }
}

/// COO (Coordinate) sparse tensor
///
/// Stores one coordinate buffer per mode plus the values.
/// Flexible and easy to construct, but not optimized for operations.
#[derive(Debug, Clone, PartialEq)]
pub struct CooTensor<T> {
    /// Coordinate buffers, one per mode, each of length nnz
    coords: Vec<Vec<usize>>,

    /// Values at the corresponding coordinates
    values: Vec<T>,

    /// Shape of the tensor
    shape: Vec<usize>,
}

fn check_shape(shape: &[usize]) -> Result<(), CooError> {
    if shape.is_empty() {
        return Err(CooError::InvalidShape("Shape cannot be empty".to_string()));
    }
    if shape.contains(&0) {
        return Err(CooError::InvalidShape(
            "Shape cannot contain zeros".to_string(),
        ));
    }
    Ok(())
}

/// Whether a dense array of this shape has an addressable element count.
///
/// Zero extents are skipped, matching the limit `ndarray` enforces on allocation.
pub(crate) fn fits_dense(shape: &[usize]) -> bool {
    shape
        .iter()
        .filter(|&&extent| extent != 0)
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
        .is_some_and(|len| len <= isize::MAX as usize)
}

impl<T: Clone> CooTensor<T> {
    /// Create a new COO sparse tensor from per-mode coordinate buffers
    ///
    /// # Arguments
    ///
    /// * `coords` - One coordinate buffer per mode
    /// * `values` - Values of the nonzero entries
    /// * `shape` - Shape of the tensor
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The shape is empty or contains zeros
    /// - The number of coordinate buffers doesn't match the shape
    /// - A coordinate buffer and the values have different lengths
    /// - Any coordinate is out of bounds
    ///
    /// Entries are not required to be sorted; see [`CooTensor::sort`].
    pub fn new(
        coords: Vec<Vec<usize>>,
        values: Vec<T>,
        shape: Vec<usize>,
    ) -> Result<Self, CooError> {
        check_shape(&shape)?;

        if coords.len() != shape.len() {
            return Err(CooError::ShapeMismatch {
                coords_len: coords.len(),
                shape_len: shape.len(),
            });
        }

        for (mode, buf) in coords.iter().enumerate() {
            if buf.len() != values.len() {
                return Err(CooError::LengthMismatch {
                    mode,
                    coords: buf.len(),
                    values: values.len(),
                });
            }
        }

        let coo = Self {
            coords,
            values,
            shape,
        };

        // Check bounds
        for i in 0..coo.nnz() {
            if coo.coords.iter().zip(&coo.shape).any(|(buf, &size)| buf[i] >= size) {
                return Err(CooError::IndexOutOfBounds {
                    index: coo.entry(i),
                    shape: coo.shape.clone(),
                });
            }
        }

        Ok(coo)
    }

    /// Create a COO tensor from one coordinate tuple per nonzero
    ///
    /// # Examples
    ///
    /// ```
    /// use csfkit_sparse::CooTensor;
    ///
    /// let coo = CooTensor::from_entries(
    ///     vec![vec![0, 1], vec![2, 0]],
    ///     vec![1.0, 2.0],
    ///     vec![3, 3],
    /// ).unwrap();
    /// assert_eq!(coo.coords(1), &[1, 0]);
    /// ```
    pub fn from_entries(
        entries: Vec<Vec<usize>>,
        values: Vec<T>,
        shape: Vec<usize>,
    ) -> Result<Self, CooError> {
        check_shape(&shape)?;

        if entries.len() != values.len() {
            return Err(CooError::LengthMismatch {
                mode: 0,
                coords: entries.len(),
                values: values.len(),
            });
        }

        let mut coords = vec![Vec::with_capacity(entries.len()); shape.len()];
        for entry in &entries {
            if entry.len() != shape.len() {
                return Err(CooError::ShapeMismatch {
                    coords_len: entry.len(),
                    shape_len: shape.len(),
                });
            }
            for (buf, &coord) in coords.iter_mut().zip(entry) {
                buf.push(coord);
            }
        }

        Self::new(coords, values, shape)
    }

    /// Create a COO tensor without validating shape, lengths or bounds
    ///
    /// The caller guarantees the invariants checked by [`CooTensor::new`].
    pub fn from_coords_unchecked(
        coords: Vec<Vec<usize>>,
        values: Vec<T>,
        shape: Vec<usize>,
    ) -> Self {
        Self {
            coords,
            values,
            shape,
        }
    }

    /// Create an empty COO tensor with given shape
    pub fn zeros(shape: Vec<usize>) -> Result<Self, CooError> {
        check_shape(&shape)?;

        Ok(Self {
            coords: vec![Vec::new(); shape.len()],
            values: Vec::new(),
            shape,
        })
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Rank (number of dimensions)
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Coordinate buffer of one mode
    ///
    /// # Panics
    ///
    /// Panics if `mode >= rank()`.
    pub fn coords(&self, mode: usize) -> &[usize] {
        &self.coords[mode]
    }

    /// Get values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Coordinate tuple of entry `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= nnz()`.
    pub fn entry(&self, i: usize) -> Vec<usize> {
        self.coords.iter().map(|buf| buf[i]).collect()
    }

    /// Compute density (nnz / total_elements)
    pub fn density(&self) -> f64 {
        let total: f64 = self.shape.iter().map(|&extent| extent as f64).product();
        if total == 0.0 {
            return 0.0;
        }
        self.nnz() as f64 / total
    }

    /// Add a non-zero element
    ///
    /// Note: Neither ordering nor duplicates are checked. Use `sort()` or
    /// `deduplicate()` after construction.
    pub fn push(&mut self, index: Vec<usize>, value: T) -> Result<(), CooError> {
        if index.len() != self.shape.len() {
            return Err(CooError::ShapeMismatch {
                coords_len: index.len(),
                shape_len: self.shape.len(),
            });
        }

        if index.iter().zip(&self.shape).any(|(&coord, &size)| coord >= size) {
            return Err(CooError::IndexOutOfBounds {
                index,
                shape: self.shape.clone(),
            });
        }

        for (buf, coord) in self.coords.iter_mut().zip(index) {
            buf.push(coord);
        }
        self.values.push(value);
        Ok(())
    }

    fn cmp_entries(&self, i: usize, j: usize) -> Ordering {
        self.coords
            .iter()
            .map(|buf| buf[i].cmp(&buf[j]))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether entries are in row-major (lexicographic) order
    ///
    /// Equal neighbouring coordinates are allowed.
    pub fn is_sorted(&self) -> bool {
        (1..self.nnz()).all(|i| self.cmp_entries(i - 1, i) != Ordering::Greater)
    }

    /// Sort entries in row-major (C-contiguous) order
    ///
    /// The sort is stable, so duplicates keep their relative order. This is
    /// the order the CSF builder expects.
    pub fn sort(&mut self) {
        if self.is_sorted() {
            return;
        }

        let mut perm: Vec<usize> = (0..self.nnz()).collect();
        perm.sort_by(|&i, &j| self.cmp_entries(i, j));
        self.apply_permutation(&perm);
    }

    fn apply_permutation(&mut self, perm: &[usize]) {
        for buf in &mut self.coords {
            *buf = perm.iter().map(|&p| buf[p]).collect();
        }
        self.values = perm.iter().map(|&p| self.values[p].clone()).collect();
    }
}

impl<T> CooSource<T> for CooTensor<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn data(&self) -> &[T] {
        &self.values
    }

    fn coords(&self, mode: usize) -> &[usize] {
        &self.coords[mode]
    }
}

impl<T: Float> CooTensor<T> {
    /// Convert to a dense array
    ///
    /// Duplicate coordinates overwrite each other; call `deduplicate()` first
    /// to sum them.
    ///
    /// # Complexity
    ///
    /// Time: O(nnz × ndim)
    /// Space: O(∏ᵢ shape\[i\])
    ///
    /// # Errors
    ///
    /// Returns `CooError::InvalidShape` if the shape is too large to allocate.
    pub fn to_dense(&self) -> Result<ArrayD<T>, CooError> {
        if !fits_dense(&self.shape) {
            return Err(CooError::InvalidShape(format!(
                "{:?} is too large for a dense array",
                self.shape
            )));
        }

        let mut dense = ArrayD::zeros(self.shape.to_vec());
        for (i, &value) in self.values.iter().enumerate() {
            dense[self.entry(i).as_slice()] = value;
        }
        Ok(dense)
    }

    /// Create COO tensor from a dense array
    ///
    /// Only stores elements where |value| > threshold. Entries come out in
    /// row-major order, so the result is already sorted.
    pub fn from_dense(dense: &ArrayD<T>, threshold: T) -> Self {
        let shape = dense.shape().to_vec();
        let mut coords = vec![Vec::new(); shape.len()];
        let mut values = Vec::new();

        for (idx, &value) in dense.indexed_iter() {
            if value.abs() > threshold {
                for (buf, &coord) in coords.iter_mut().zip(idx.slice()) {
                    buf.push(coord);
                }
                values.push(value);
            }
        }

        Self {
            coords,
            values,
            shape,
        }
    }

    /// Deduplicate entries by summing values at the same coordinate
    ///
    /// Leaves the tensor sorted.
    pub fn deduplicate(&mut self) {
        self.sort();
        if self.nnz() <= 1 {
            return;
        }

        let mut write_idx = 0;
        for read_idx in 1..self.nnz() {
            if self.cmp_entries(write_idx, read_idx) == Ordering::Equal {
                self.values[write_idx] = self.values[write_idx] + self.values[read_idx];
            } else {
                write_idx += 1;
                if write_idx != read_idx {
                    for buf in &mut self.coords {
                        buf[write_idx] = buf[read_idx];
                    }
                    self.values[write_idx] = self.values[read_idx];
                }
            }
        }

        for buf in &mut self.coords {
            buf.truncate(write_idx + 1);
        }
        self.values.truncate(write_idx + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coo_creation() {
        let coords = vec![vec![0, 1, 2], vec![1, 2, 0]];
        let values = vec![2.5, 3.0, 1.5];
        let shape = vec![3, 4];

        let coo = CooTensor::new(coords, values, shape).unwrap();
        assert_eq!(coo.nnz(), 3);
        assert_eq!(coo.shape(), &[3, 4]);
        assert_eq!(coo.rank(), 2);
        assert_eq!(coo.entry(1), vec![1, 2]);
    }

    #[test]
    fn test_coo_rejects_bad_input() {
        // Buffer count vs shape
        let err = CooTensor::new(vec![vec![0]], vec![1.0], vec![2, 2]).unwrap_err();
        assert!(matches!(err, CooError::ShapeMismatch { .. }));

        // Buffer length vs values
        let err = CooTensor::new(vec![vec![0, 1], vec![0]], vec![1.0, 2.0], vec![2, 2])
            .unwrap_err();
        assert!(matches!(err, CooError::LengthMismatch { mode: 1, .. }));

        // Bounds
        let err = CooTensor::new(vec![vec![0, 2], vec![0, 0]], vec![1.0, 2.0], vec![2, 2])
            .unwrap_err();
        match err {
            CooError::IndexOutOfBounds { index, shape } => {
                assert_eq!(index, vec![2, 0]);
                assert_eq!(shape, vec![2, 2]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(CooTensor::<f64>::zeros(vec![]).is_err());
        assert!(CooTensor::<f64>::zeros(vec![3, 0]).is_err());
    }

    #[test]
    fn test_coo_from_entries() {
        let entries = vec![vec![0, 1, 2], vec![1, 0, 1]];
        let coo = CooTensor::from_entries(entries, vec![1.0, 2.0], vec![2, 2, 3]).unwrap();

        assert_eq!(coo.coords(0), &[0, 1]);
        assert_eq!(coo.coords(1), &[1, 0]);
        assert_eq!(coo.coords(2), &[2, 1]);

        let err = CooTensor::from_entries(vec![vec![0, 1]], vec![1.0], vec![2, 2, 3]);
        assert!(err.is_err());
    }

    #[test]
    fn test_coo_density() {
        let coo = CooTensor::new(vec![vec![0, 1], vec![0, 1]], vec![1.0, 2.0], vec![10, 10])
            .unwrap();
        assert_eq!(coo.density(), 0.02); // 2/100
    }

    #[test]
    fn test_coo_large_shape() {
        let shape = vec![4, 1 << 30, 1 << 30, 1 << 30];
        let coo = CooTensor::new(vec![vec![3], vec![7], vec![0], vec![1]], vec![1.0], shape)
            .unwrap();

        let expected = 1.0 / (4.0 * 2f64.powi(90));
        assert!((coo.density() - expected).abs() <= expected * 1e-12);
        assert!(matches!(coo.to_dense(), Err(CooError::InvalidShape(_))));
    }

    #[test]
    fn test_coo_from_coords_unchecked() {
        let coo = CooTensor::from_coords_unchecked(
            vec![vec![1, 0], vec![2, 1]],
            vec![5.0, 6.0],
            vec![2, 3],
        );
        assert_eq!(coo.nnz(), 2);
        assert_eq!(coo.entry(1), vec![0, 1]);
        assert!(!coo.is_sorted());
        assert_eq!(
            coo,
            CooTensor::new(vec![vec![1, 0], vec![2, 1]], vec![5.0, 6.0], vec![2, 3]).unwrap()
        );
    }

    #[test]
    fn test_coo_push() {
        let mut coo = CooTensor::<f64>::zeros(vec![3, 3]).unwrap();
        coo.push(vec![0, 0], 1.0).unwrap();
        coo.push(vec![1, 1], 2.0).unwrap();
        assert!(coo.push(vec![3, 1], 2.0).is_err());
        assert!(coo.push(vec![1], 2.0).is_err());

        assert_eq!(coo.nnz(), 2);
        assert_eq!(coo.coords(0), &[0, 1]);
    }

    #[test]
    fn test_coo_sort() {
        let entries = vec![vec![2, 0], vec![0, 1], vec![1, 0], vec![0, 0]];
        let mut coo =
            CooTensor::from_entries(entries, vec![1.0, 2.0, 3.0, 4.0], vec![3, 3]).unwrap();
        assert!(!coo.is_sorted());

        coo.sort();

        assert!(coo.is_sorted());
        assert_eq!(coo.coords(0), &[0, 0, 1, 2]);
        assert_eq!(coo.coords(1), &[0, 1, 0, 0]);
        assert_eq!(coo.values(), &[4.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_coo_deduplicate() {
        let entries = vec![vec![1, 1], vec![0, 0], vec![1, 1], vec![0, 0], vec![2, 2]];
        let values = vec![3.0, 1.0, 4.0, 2.0, 5.0];

        let mut coo = CooTensor::from_entries(entries, values, vec![3, 3]).unwrap();
        coo.deduplicate();

        assert_eq!(coo.nnz(), 3);
        assert_eq!(coo.values(), &[3.0, 7.0, 5.0]);
        assert_eq!(coo.coords(0), &[0, 1, 2]);
    }

    #[test]
    fn test_coo_dense_roundtrip() {
        let coo = CooTensor::new(
            vec![vec![0, 1, 2], vec![1, 0, 2]],
            vec![1.0, 2.0, 3.0],
            vec![3, 3],
        )
        .unwrap();

        let dense = coo.to_dense().unwrap();
        assert_eq!(dense.shape(), &[3, 3]);
        assert_eq!(dense[[0, 1]], 1.0);
        assert_eq!(dense[[1, 0]], 2.0);
        assert_eq!(dense[[2, 2]], 3.0);
        assert_eq!(dense[[0, 0]], 0.0);

        let back = CooTensor::from_dense(&dense, 1e-10);
        assert_eq!(back, coo);
    }

    #[test]
    fn test_coo_source_impl() {
        let coo = CooTensor::new(vec![vec![0, 1], vec![2, 0]], vec![1.0, 2.0], vec![2, 3])
            .unwrap();
        let source: &dyn CooSource<f64> = &coo;

        assert_eq!(source.ndim(), 2);
        assert_eq!(source.nnz(), 2);
        assert_eq!(source.coords(1), &[2, 0]);
        assert_eq!(source.data(), &[1.0, 2.0]);
    }
}
