//! Parallel CSF construction
//!
//! This module provides a parallel implementation of the middle-level
//! compression used by the CSF builder.
//!
//! # Features
//!
//! - Parallel fiber counting, one task per parent node
//! - Prefix sum over the counts, which is also the parent's retargeted pointer array
//! - Parallel fill into disjoint, pre-partitioned regions of the new level
//! - Automatic fallback to sequential when `parallel` feature is disabled
//!
//! # Performance
//!
//! Parallel construction typically pays off for tensors with nnz > 100,000.
//! For small tensors the sequential builder is faster due to threading overhead,
//! which is why [`CsfBuilder`](crate::CsfBuilder) only switches above its
//! parallel threshold.
//!
//! # Examples
//!
//! ```rust
//! use csfkit_sparse::CooTensor;
//! use csfkit_sparse::parallel::par_coo_to_csf;
//!
//! let coo = CooTensor::new(
//!     vec![vec![0, 0, 1], vec![0, 1, 1], vec![2, 0, 1]],
//!     vec![1.0, 2.0, 3.0],
//!     vec![2, 2, 3],
//! ).unwrap();
//!
//! let csf = par_coo_to_csf(&coo).unwrap();
//! assert_eq!(csf.indlen(), &[2, 3, 3]);
//! ```

use crate::coo::CooSource;
use crate::csf::{CsfBuilder, CsfError, CsfTensor};

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

#[cfg(feature = "parallel")]
use crate::csf::{count_runs, run_starts, Level};

/// Parallel COO → CSF conversion
///
/// Builds every middle level in parallel regardless of the input size. The
/// result is identical to [`CsfTensor::from_coo`].
///
/// # Complexity
///
/// O(nnz × ndim) work
#[cfg(feature = "parallel")]
pub fn par_coo_to_csf<T, S>(coo: &S) -> Result<CsfTensor<T>, CsfError>
where
    T: Clone,
    S: CooSource<T> + ?Sized,
{
    CsfBuilder::new().with_parallel_threshold(0).build(coo)
}

/// Sequential fallback for par_coo_to_csf when parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub fn par_coo_to_csf<T, S>(coo: &S) -> Result<CsfTensor<T>, CsfError>
where
    T: Clone,
    S: CooSource<T> + ?Sized,
{
    CsfBuilder::new().build(coo)
}

/// One parent node's share of the new level.
#[cfg(feature = "parallel")]
struct Region<'a> {
    start: usize,
    end: usize,
    indptr: &'a mut [usize],
    indices: &'a mut [usize],
}

/// Parallel counterpart of the sequential level compression.
#[cfg(feature = "parallel")]
pub(crate) fn par_compress_level(parent: &[usize], coords: &[usize]) -> Level {
    let nnz = coords.len();
    let num_slices = parent.len() - 1;

    // Counting pass
    let counts: Vec<usize> = (0..num_slices)
        .into_par_iter()
        .map(|k| count_runs(&coords[parent[k]..parent[k + 1]]))
        .collect();

    // Prefix sum (must be sequential)
    let mut retargeted = Vec::with_capacity(parent.len());
    let mut num_fibs = 0;
    retargeted.push(0);
    for &count in &counts {
        num_fibs += count;
        retargeted.push(num_fibs);
    }

    let mut indptr = vec![0; num_fibs + 1];
    let mut indices = vec![0; num_fibs];

    // Partition the new level so that every parent owns its own write region
    let mut regions = Vec::with_capacity(num_slices);
    let mut ptr_rest: &mut [usize] = &mut indptr[..num_fibs];
    let mut idx_rest: &mut [usize] = &mut indices[..];
    for (k, &count) in counts.iter().enumerate() {
        let (ptr_head, ptr_tail) = std::mem::take(&mut ptr_rest).split_at_mut(count);
        let (idx_head, idx_tail) = std::mem::take(&mut idx_rest).split_at_mut(count);
        ptr_rest = ptr_tail;
        idx_rest = idx_tail;
        regions.push(Region {
            start: parent[k],
            end: parent[k + 1],
            indptr: ptr_head,
            indices: idx_head,
        });
    }

    // Fill pass
    regions.into_par_iter().for_each(|region| {
        let runs = run_starts(&coords[region.start..region.end]);
        for ((offset, coord), (ptr, idx)) in
            runs.zip(region.indptr.iter_mut().zip(region.indices.iter_mut()))
        {
            *ptr = region.start + offset;
            *idx = coord;
        }
    });

    indptr[num_fibs] = nnz;
    Level {
        indptr,
        indices,
        retargeted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CooTensor;

    fn banded_tensor(n: usize) -> CooTensor<f64> {
        let mut coo = CooTensor::zeros(vec![n, n, 4, 3]).unwrap();
        for i in 0..n {
            for j in i.saturating_sub(1)..(i + 2).min(n) {
                for k in 0..4 {
                    if (i + j + k) % 3 != 0 {
                        coo.push(vec![i, j, k, (i * j + k) % 3], (i + j + k) as f64)
                            .unwrap();
                    }
                }
            }
        }
        coo
    }

    #[test]
    fn test_par_matches_sequential() {
        let coo = banded_tensor(40);
        assert!(coo.is_sorted());

        let seq = CsfBuilder::new().build(&coo).unwrap();
        let par = par_coo_to_csf(&coo).unwrap();
        assert_eq!(par, seq);
        par.check_invariants().unwrap();
    }

    #[test]
    fn test_par_empty_and_single_mode() {
        let empty = CooTensor::<f64>::zeros(vec![3, 2, 2]).unwrap();
        let csf = par_coo_to_csf(&empty).unwrap();
        assert_eq!(csf.indlen(), &[3, 0, 0]);

        let vector = CooTensor::new(vec![vec![0, 2]], vec![1.0, 2.0], vec![3]).unwrap();
        let csf = par_coo_to_csf(&vector).unwrap();
        assert_eq!(csf.indices(0), &[0, 2]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_par_compress_level_partitions() {
        let parent = vec![0, 3, 3, 6];
        let coords = vec![0, 0, 1, 2, 2, 2];
        let level = par_compress_level(&parent, &coords);

        assert_eq!(level.indices, vec![0, 1, 2]);
        assert_eq!(level.indptr, vec![0, 2, 3, 6]);
        assert_eq!(level.retargeted, vec![0, 2, 2, 3]);
    }
}
