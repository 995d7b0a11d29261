//! CSF (Compressed Sparse Fiber) format for N-dimensional sparse tensors
//!
//! # Overview
//!
//! CSF is a hierarchical sparse tensor format that generalizes CSR to N dimensions.
//! It stores a tensor as a tree with one level per mode: a node at level `m`
//! stands for all nonzeros sharing the same coordinates in modes `0..=m`.
//!
//! # Structure
//!
//! For an n-mode tensor, CSF has:
//! - `indices[m]`: coordinate of every node at level m (m = 0..n)
//! - `indptrs[m]`: child ranges of the nodes at level m (m = 0..n-1); the
//!   children of node `k` are `indptrs[m][k]..indptrs[m][k + 1]` at level m+1
//! - `indlen[m]`: number of nodes at level m
//! - `data`: nonzero values, aligned with `indices[n-1]`
//!
//! Level 0 has one node per mode-0 coordinate in `0..shape[0]`, including
//! coordinates without any nonzero. The leaf level is the last coordinate
//! buffer of the input, unchanged.
//!
//! # Example
//!
//! For a 3D tensor with nonzeros at (0,1,2)=5, (0,1,3)=6, (1,2,3)=7 and shape [2, 3, 4]:
//!
//! - Level 0: `indptrs[0] = [0, 1, 2]`, `indices[0] = [0, 1]`
//! - Level 1: `indptrs[1] = [0, 2, 3]`, `indices[1] = [1, 2]`
//! - Level 2 (leaf): `indices[2] = [2, 3, 3]`, `data = [5.0, 6.0, 7.0]`
//!
//! # Construction
//!
//! The builder expects entries in row-major (lexicographic) order. Mode 0 is a
//! single cursor scan. Every middle mode is compressed with two passes over the
//! previous level's slices: one to count fibers, so each level is allocated
//! exactly once, and one to fill them. While a level is in progress its
//! pointers address nonzeros; once the next level is built they are rewritten
//! to address child nodes.
//!
//! # Complexity
//!
//! - **Construction from sorted COO**: O(nnz × ndim)
//! - **Fiber iteration**: O(nnz × ndim) to visit all nonzeros
//! - **Memory**: O(nnz) + O(number of fibers at each level)

use std::fmt;
use std::mem;
use std::ops::Range;

use anyhow::{bail, Result};
use scirs2_core::ndarray_ext::ArrayD;
use scirs2_core::numeric::Float;
use thiserror::Error;

use crate::coo::{fits_dense, CooSource, CooTensor};
use crate::error::ValidationError;
use crate::iterators::CsfIter;

/// Inputs with at least this many nonzeros are built in parallel when the
/// `parallel` feature is enabled.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsfError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Malformed CSF level {level}: {reason}")]
    Malformed { level: usize, reason: String },
}

/// CSF (Compressed Sparse Fiber) tensor
///
/// Built once from a sorted COO source and never modified afterwards. All
/// buffers are owned, so the tensor outlives its source.
///
/// # Examples
///
/// ```
/// use csfkit_sparse::{CooTensor, CsfTensor};
///
/// let mut coo = CooTensor::zeros(vec![3, 4, 5]).unwrap();
/// coo.push(vec![0, 1, 2], 5.0).unwrap();
/// coo.push(vec![0, 1, 3], 6.0).unwrap();
/// coo.push(vec![1, 2, 3], 7.0).unwrap();
///
/// let csf = CsfTensor::from_coo(&coo).unwrap();
/// assert_eq!(csf.nnz(), 3);
/// assert_eq!(csf.shape(), &[3, 4, 5]);
/// assert_eq!(csf.indlen(), &[3, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsfTensor<T> {
    /// Shape of the tensor
    shape: Vec<usize>,
    /// Number of nonzeros
    nnz: usize,
    /// Node count per level
    indlen: Vec<usize>,
    /// Child pointers for every level but the last
    /// indptrs[m] has length = indlen[m] + 1
    indptrs: Vec<Vec<usize>>,
    /// Node coordinates for every level
    indices: Vec<Vec<usize>>,
    /// Values (at leaf level)
    data: Vec<T>,
}

/// Nodes of one freshly compressed level.
///
/// `indptr` still addresses nonzeros, `retargeted` holds the parent level's
/// pointers rewritten to address the nodes of this level.
pub(crate) struct Level {
    pub(crate) indptr: Vec<usize>,
    pub(crate) indices: Vec<usize>,
    pub(crate) retargeted: Vec<usize>,
}

/// Run starts of `slice` as `(offset within slice, coordinate)`.
///
/// The first entry always starts a run; later entries start one when their
/// coordinate differs from the previous entry.
pub(crate) fn run_starts(slice: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    slice
        .iter()
        .enumerate()
        .filter(move |&(j, &coord)| j == 0 || slice[j - 1] != coord)
        .map(|(j, &coord)| (j, coord))
}

pub(crate) fn count_runs(slice: &[usize]) -> usize {
    match slice.first() {
        None => 0,
        Some(_) => 1 + slice.windows(2).filter(|w| w[0] != w[1]).count(),
    }
}

/// Root level: one node per mode-0 coordinate in `0..extent`.
///
/// Returns `(indptr, indices)`, with `indptr` addressing nonzeros.
fn build_root(extent: usize, coords: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let nnz = coords.len();
    let mut indptr = Vec::with_capacity(extent + 1);
    indptr.push(0);

    let mut cursor = 0;
    for slice_id in 0..extent {
        while cursor < nnz && coords[cursor] == slice_id {
            cursor += 1;
        }
        indptr.push(cursor);
    }

    (indptr, (0..extent).collect())
}

/// Compress one middle level against the parent's nonzero ranges.
fn compress_level(parent: &[usize], coords: &[usize]) -> Level {
    let nnz = coords.len();

    // Counting pass
    let num_fibs: usize = parent
        .windows(2)
        .map(|w| count_runs(&coords[w[0]..w[1]]))
        .sum();

    let mut indptr = Vec::with_capacity(num_fibs + 1);
    let mut indices = Vec::with_capacity(num_fibs);
    let mut retargeted = Vec::with_capacity(parent.len());

    // Fill pass
    for w in parent.windows(2) {
        let start = w[0];
        retargeted.push(indices.len());
        for (offset, coord) in run_starts(&coords[start..w[1]]) {
            indptr.push(start + offset);
            indices.push(coord);
        }
    }
    retargeted.push(indices.len());
    indptr.push(nnz);

    debug_assert_eq!(indices.len(), num_fibs);
    Level {
        indptr,
        indices,
        retargeted,
    }
}

/// Structural checks: cheap, always run, and enough to keep construction in bounds.
fn check_structure<T, S>(source: &S) -> Result<(), ValidationError>
where
    S: CooSource<T> + ?Sized,
{
    let ndim = source.ndim();
    if ndim == 0 {
        return Err(ValidationError::EmptyShape);
    }
    if source.shape().len() != ndim {
        return Err(ValidationError::ShapeDimsMismatch {
            expected: ndim,
            got: source.shape().len(),
        });
    }

    let nnz = source.nnz();
    if source.data().len() != nnz {
        return Err(ValidationError::LengthMismatch {
            mode: 0,
            coords: nnz,
            values: source.data().len(),
        });
    }
    for mode in 0..ndim {
        let len = source.coords(mode).len();
        if len != nnz {
            return Err(ValidationError::LengthMismatch {
                mode,
                coords: len,
                values: nnz,
            });
        }
    }
    Ok(())
}

/// Range and ordering checks in one pass over the entries.
fn check_contents<T, S>(source: &S) -> Result<(), ValidationError>
where
    S: CooSource<T> + ?Sized,
{
    let shape = source.shape();
    let buffers: Vec<&[usize]> = (0..source.ndim()).map(|m| source.coords(m)).collect();

    for position in 0..source.nnz() {
        for (mode, (buf, &extent)) in buffers.iter().zip(shape).enumerate() {
            if buf[position] >= extent {
                return Err(ValidationError::CoordinateOutOfBounds {
                    position,
                    mode,
                    coord: buf[position],
                    extent,
                });
            }
        }

        if position > 0 {
            let descending = buffers
                .iter()
                .map(|buf| buf[position - 1].cmp(&buf[position]))
                .find(|ord| ord.is_ne())
                .is_some_and(|ord| ord.is_gt());
            if descending {
                return Err(ValidationError::UnsortedIndices { position });
            }
        }
    }
    Ok(())
}

/// Configures and runs COO → CSF construction.
///
/// # Examples
///
/// ```
/// use csfkit_sparse::{CooTensor, CsfBuilder};
///
/// let coo = CooTensor::new(
///     vec![vec![0, 1, 1], vec![2, 0, 1]],
///     vec![1.0, 2.0, 3.0],
///     vec![2, 3],
/// ).unwrap();
///
/// let csf = CsfBuilder::new()
///     .with_parallel_threshold(1_000_000)
///     .build(&coo)
///     .unwrap();
/// assert_eq!(csf.indptr(0), Some(&[0, 1, 3][..]));
/// ```
#[derive(Clone, Debug)]
pub struct CsfBuilder {
    validate: bool,
    parallel_threshold: usize,
}

impl Default for CsfBuilder {
    fn default() -> Self {
        Self {
            validate: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl CsfBuilder {
    /// Create a validating builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that trusts the input order and coordinate ranges
    pub fn unchecked() -> Self {
        Self::default().with_validation(false)
    }

    /// Enable or disable range and ordering validation
    ///
    /// Length and dimension checks always run. Without validation, unsorted
    /// input yields a tree that fails [`CsfTensor::check_invariants`] or
    /// misplaces nonzeros, but construction never reads out of bounds.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Minimum nnz for building levels in parallel
    ///
    /// Ignored unless the `parallel` feature is enabled.
    pub fn with_parallel_threshold(mut self, nnz: usize) -> Self {
        self.parallel_threshold = nnz;
        self
    }

    pub fn validates(&self) -> bool {
        self.validate
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    fn compress(&self, parent: &[usize], coords: &[usize]) -> Level {
        #[cfg(feature = "parallel")]
        {
            if coords.len() >= self.parallel_threshold {
                return crate::parallel::par_compress_level(parent, coords);
            }
        }
        compress_level(parent, coords)
    }

    /// Build a CSF tensor from a COO source
    ///
    /// # Errors
    ///
    /// Returns [`CsfError::InvalidInput`] before any construction work if the
    /// source is structurally inconsistent or, when validating, if a
    /// coordinate is out of range or entries are not lexicographically sorted.
    pub fn build<T, S>(&self, source: &S) -> Result<CsfTensor<T>, CsfError>
    where
        T: Clone,
        S: CooSource<T> + ?Sized,
    {
        let checked = check_structure::<T, S>(source).and_then(|()| {
            if self.validate {
                check_contents::<T, S>(source)
            } else {
                Ok(())
            }
        });
        if let Err(err) = checked {
            tracing::debug!(error = %err, "rejected COO input");
            return Err(err.into());
        }

        let ndim = source.ndim();
        let nnz = source.nnz();
        let shape = source.shape().to_vec();
        let _span = tracing::debug_span!("csf_build", ndim, nnz).entered();

        let data = source.data().to_vec();
        let leaves = source.coords(ndim - 1).to_vec();

        if ndim == 1 {
            return Ok(CsfTensor {
                shape,
                nnz,
                indlen: vec![nnz],
                indptrs: Vec::new(),
                indices: vec![leaves],
                data,
            });
        }

        let mut indptrs = Vec::with_capacity(ndim - 1);
        let mut indices = Vec::with_capacity(ndim);

        let (root_ptr, root_ids) = build_root(shape[0], source.coords(0));
        indptrs.push(root_ptr);
        indices.push(root_ids);

        for mode in 1..ndim - 1 {
            let level = self.compress(&indptrs[mode - 1], source.coords(mode));
            tracing::trace!(mode, num_fibs = level.indices.len(), "compressed level");

            // Hand the parent its child-node pointers, then keep the new level
            // as the nonzero ranges for the next mode.
            indptrs[mode - 1] = level.retargeted;
            indptrs.push(level.indptr);
            indices.push(level.indices);
        }
        indices.push(leaves);

        let indlen: Vec<usize> = indices.iter().map(Vec::len).collect();
        tracing::debug!(?indlen, "built CSF tree");

        Ok(CsfTensor {
            shape,
            nnz,
            indlen,
            indptrs,
            indices,
            data,
        })
    }
}

impl<T: Clone> CsfTensor<T> {
    /// Creates a CSF tensor from a sorted COO source.
    ///
    /// Shorthand for `CsfBuilder::new().build(coo)`.
    ///
    /// # Complexity
    ///
    /// O(nnz × ndim)
    ///
    /// # Examples
    ///
    /// ```
    /// use csfkit_sparse::{CooTensor, CsfTensor};
    ///
    /// let mut coo = CooTensor::zeros(vec![3, 3, 3]).unwrap();
    /// coo.push(vec![1, 2, 0], 2.0).unwrap();
    /// coo.push(vec![0, 1, 2], 1.0).unwrap();
    ///
    /// // Unsorted input is rejected
    /// assert!(CsfTensor::from_coo(&coo).is_err());
    ///
    /// coo.sort();
    /// let csf = CsfTensor::from_coo(&coo).unwrap();
    /// assert_eq!(csf.nnz(), 2);
    /// ```
    pub fn from_coo<S>(coo: &S) -> Result<Self, CsfError>
    where
        S: CooSource<T> + ?Sized,
    {
        CsfBuilder::new().build(coo)
    }

    /// Creates a CSF tensor without range and ordering validation.
    pub fn from_coo_unchecked<S>(coo: &S) -> Result<Self, CsfError>
    where
        S: CooSource<T> + ?Sized,
    {
        CsfBuilder::unchecked().build(coo)
    }

    /// Converts CSF back to COO format.
    ///
    /// # Complexity
    ///
    /// O(nnz × ndim)
    ///
    /// # Examples
    ///
    /// ```
    /// use csfkit_sparse::{CooTensor, CsfTensor};
    ///
    /// let mut coo = CooTensor::zeros(vec![4, 4, 4]).unwrap();
    /// coo.push(vec![0, 1, 2], 5.0).unwrap();
    /// coo.push(vec![1, 2, 3], 7.0).unwrap();
    ///
    /// let csf = CsfTensor::from_coo(&coo).unwrap();
    /// let coo_back = csf.to_coo().unwrap();
    /// assert_eq!(coo_back, coo);
    /// ```
    pub fn to_coo(&self) -> Result<CooTensor<T>> {
        let mut coords = vec![Vec::with_capacity(self.nnz); self.ndim()];
        let mut values = Vec::with_capacity(self.nnz);

        for (index, value) in self.iter() {
            for (buf, coord) in coords.iter_mut().zip(index) {
                buf.push(coord);
            }
            values.push(value.clone());
        }

        if values.len() != self.nnz {
            bail!(
                "CSF traversal reached {} of {} leaves",
                values.len(),
                self.nnz
            );
        }

        Ok(CooTensor::new(coords, values, self.shape.clone())?)
    }
}

impl<T> CsfTensor<T> {
    /// Returns the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of nonzeros.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Returns the node count of every level.
    #[inline]
    pub fn indlen(&self) -> &[usize] {
        &self.indlen
    }

    /// Returns the density (nnz / total elements).
    pub fn density(&self) -> f64 {
        let total: f64 = self.shape.iter().map(|&extent| extent as f64).product();
        if total == 0.0 {
            return 0.0;
        }
        self.nnz as f64 / total
    }

    /// Returns the node coordinates at the specified level.
    ///
    /// # Panics
    ///
    /// Panics if level >= ndim.
    #[inline]
    pub fn indices(&self, level: usize) -> &[usize] {
        &self.indices[level]
    }

    /// Returns the child pointers at the specified level, or `None` for the
    /// leaf level (and beyond).
    #[inline]
    pub fn indptr(&self, level: usize) -> Option<&[usize]> {
        self.indptrs.get(level).map(Vec::as_slice)
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Child range of `node` at `level`, as node positions at `level + 1`.
    ///
    /// Returns `None` for leaves and out-of-range nodes.
    pub fn children(&self, level: usize, node: usize) -> Option<Range<usize>> {
        let ptr = self.indptrs.get(level)?;
        let start = *ptr.get(node)?;
        let end = *ptr.get(node + 1)?;
        Some(start..end)
    }

    /// Iterates over all nonzeros as (coordinates, value) pairs in leaf order.
    ///
    /// # Examples
    ///
    /// ```
    /// use csfkit_sparse::{CooTensor, CsfTensor};
    ///
    /// let mut coo = CooTensor::zeros(vec![2, 2, 2]).unwrap();
    /// coo.push(vec![0, 0, 1], 1.0).unwrap();
    /// coo.push(vec![1, 1, 0], 2.0).unwrap();
    ///
    /// let csf = CsfTensor::from_coo(&coo).unwrap();
    /// let nonzeros: Vec<_> = csf.iter().collect();
    /// assert_eq!(nonzeros, vec![(vec![0, 0, 1], &1.0), (vec![1, 1, 0], &2.0)]);
    /// ```
    pub fn iter(&self) -> CsfIter<'_, T> {
        CsfIter::new(self)
    }

    /// Bytes held by the index, pointer and value buffers.
    pub fn memory_footprint(&self) -> usize {
        let words: usize = self.indptrs.iter().map(Vec::len).sum::<usize>()
            + self.indices.iter().map(Vec::len).sum::<usize>();
        words * mem::size_of::<usize>() + self.data.len() * mem::size_of::<T>()
    }

    /// Verify the tree invariants: pointer lengths, zero start, sentinel
    /// equal to the next level's size, and monotonic pointers.
    pub fn check_invariants(&self) -> Result<(), CsfError> {
        let malformed = |level: usize, reason: String| CsfError::Malformed { level, reason };
        let ndim = self.ndim();

        if self.indlen.len() != ndim || self.indices.len() != ndim {
            return Err(malformed(0, format!("expected {ndim} levels")));
        }
        if self.indptrs.len() != ndim - 1 {
            return Err(malformed(
                0,
                format!("expected {} pointer arrays, found {}", ndim - 1, self.indptrs.len()),
            ));
        }
        if self.data.len() != self.nnz || self.indlen[ndim - 1] != self.nnz {
            return Err(malformed(ndim - 1, "leaf level does not match nnz".to_string()));
        }

        for (level, ids) in self.indices.iter().enumerate() {
            if ids.len() != self.indlen[level] {
                return Err(malformed(
                    level,
                    format!("{} indices but indlen is {}", ids.len(), self.indlen[level]),
                ));
            }
        }

        for (level, ptr) in self.indptrs.iter().enumerate() {
            if ptr.len() != self.indlen[level] + 1 {
                return Err(malformed(
                    level,
                    format!("indptr has {} entries, expected {}", ptr.len(), self.indlen[level] + 1),
                ));
            }
            if ptr[0] != 0 {
                return Err(malformed(level, format!("indptr starts at {}", ptr[0])));
            }
            let sentinel = ptr[ptr.len() - 1];
            if sentinel != self.indlen[level + 1] {
                return Err(malformed(
                    level,
                    format!("sentinel {} != {} children", sentinel, self.indlen[level + 1]),
                ));
            }
            if let Some(k) = ptr.windows(2).position(|w| w[0] > w[1]) {
                return Err(malformed(level, format!("indptr decreases after node {k}")));
            }
        }
        Ok(())
    }
}

impl<T: Float> CsfTensor<T> {
    /// Converts CSF to a dense array.
    ///
    /// # Complexity
    ///
    /// O(nnz × ndim + total_elements)
    ///
    /// # Examples
    ///
    /// ```
    /// use csfkit_sparse::{CooTensor, CsfTensor};
    ///
    /// let mut coo = CooTensor::zeros(vec![2, 2, 2]).unwrap();
    /// coo.push(vec![0, 0, 0], 1.0).unwrap();
    /// coo.push(vec![1, 1, 1], 2.0).unwrap();
    ///
    /// let csf = CsfTensor::from_coo(&coo).unwrap();
    /// let dense = csf.to_dense().unwrap();
    /// assert_eq!(dense[[0, 0, 0]], 1.0);
    /// assert_eq!(dense[[1, 1, 1]], 2.0);
    /// assert_eq!(dense[[0, 1, 0]], 0.0);
    /// ```
    pub fn to_dense(&self) -> Result<ArrayD<T>> {
        if !fits_dense(&self.shape) {
            bail!("shape {:?} is too large for a dense array", self.shape);
        }

        let mut dense = ArrayD::zeros(self.shape.to_vec());

        let mut written = 0;
        for (index, &value) in self.iter() {
            let cell = dense
                .get_mut(index.as_slice())
                .ok_or_else(|| anyhow::anyhow!("coordinate {index:?} outside shape {:?}", self.shape))?;
            *cell = value;
            written += 1;
        }

        if written != self.nnz {
            bail!("CSF traversal reached {written} of {} leaves", self.nnz);
        }

        Ok(dense)
    }
}

impl<T> fmt::Display for CsfTensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CSF: shape={:?}, nnz={}>", self.shape, self.nnz)
    }
}
