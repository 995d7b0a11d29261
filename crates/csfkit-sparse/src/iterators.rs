//! Iterators for CSF tree traversal
//!
//! [`CsfIter`] walks the leaves of a [`CsfTensor`] left to right and rebuilds
//! each nonzero's full coordinate tuple from the node path above it.
//!
//! # Examples
//!
//! ```
//! use csfkit_sparse::{CooTensor, CsfTensor};
//!
//! let coo = CooTensor::new(
//!     vec![vec![0, 0, 1], vec![1, 2, 0]],
//!     vec![1.0, 2.0, 3.0],
//!     vec![2, 3],
//! ).unwrap();
//! let csf = CsfTensor::from_coo(&coo).unwrap();
//!
//! for (index, value) in csf.iter() {
//!     println!("{:?} = {}", index, value);
//! }
//! ```

use crate::csf::CsfTensor;

/// Iterator over CSF tensor nonzeros
///
/// Yields `(coordinates, &value)` in leaf order, which is the row-major order
/// of the source. Keeps one cursor per non-leaf level; every cursor only moves
/// forward, so a full walk costs O(nnz × ndim).
pub struct CsfIter<'a, T> {
    csf: &'a CsfTensor<T>,
    /// Current leaf
    leaf: usize,
    /// Node cursor of each non-leaf level
    path: Vec<usize>,
}

impl<'a, T> CsfIter<'a, T> {
    pub(crate) fn new(csf: &'a CsfTensor<T>) -> Self {
        Self {
            csf,
            leaf: 0,
            path: vec![0; csf.ndim().saturating_sub(1)],
        }
    }

    /// Move every cursor to the ancestor of the current leaf, bottom-up.
    fn seek_ancestors(&mut self) {
        let mut child = self.leaf;
        for level in (0..self.path.len()).rev() {
            let nodes = self.csf.indlen()[level];
            let Some(ptr) = self.csf.indptr(level) else {
                break;
            };
            let node = &mut self.path[level];
            while *node + 1 < nodes && ptr[*node + 1] <= child {
                *node += 1;
            }
            child = *node;
        }
    }
}

impl<'a, T> Iterator for CsfIter<'a, T> {
    type Item = (Vec<usize>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.leaf >= self.csf.nnz() {
            return None;
        }
        self.seek_ancestors();

        let leaf_level = self.path.len();
        let mut index = Vec::with_capacity(leaf_level + 1);
        for (level, &node) in self.path.iter().enumerate() {
            // Only a tree built from invalid unchecked input lacks the node.
            index.push(*self.csf.indices(level).get(node)?);
        }
        index.push(*self.csf.indices(leaf_level).get(self.leaf)?);
        let value = self.csf.data().get(self.leaf)?;

        self.leaf += 1;
        Some((index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.csf.nnz() - self.leaf.min(self.csf.nnz())))
    }
}

#[cfg(test)]
mod tests {
    use crate::{CooTensor, CsfTensor};

    #[test]
    fn test_iter_reproduces_sorted_entries() {
        let entries = vec![
            vec![0, 0, 0],
            vec![0, 0, 2],
            vec![0, 3, 1],
            vec![2, 0, 0],
            vec![2, 1, 1],
            vec![2, 1, 2],
        ];
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let coo = CooTensor::from_entries(entries.clone(), values.clone(), vec![3, 4, 3]).unwrap();
        let csf = CsfTensor::from_coo(&coo).unwrap();

        let walked: Vec<(Vec<usize>, f64)> = csf.iter().map(|(idx, &v)| (idx, v)).collect();
        let expected: Vec<(Vec<usize>, f64)> = entries.into_iter().zip(values).collect();
        assert_eq!(walked, expected);
    }

    #[test]
    fn test_iter_skips_empty_roots() {
        let coo = CooTensor::new(
            vec![vec![1, 3], vec![0, 1]],
            vec![1.0, 2.0],
            vec![5, 2],
        )
        .unwrap();
        let csf = CsfTensor::from_coo(&coo).unwrap();

        let walked: Vec<_> = csf.iter().map(|(idx, _)| idx).collect();
        assert_eq!(walked, vec![vec![1, 0], vec![3, 1]]);
    }

    #[test]
    fn test_iter_size_hint() {
        let coo = CooTensor::new(vec![vec![0, 1]], vec![1.0, 2.0], vec![2]).unwrap();
        let csf = CsfTensor::from_coo(&coo).unwrap();

        let mut iter = csf.iter();
        assert_eq!(iter.size_hint(), (0, Some(2)));
        iter.next();
        assert_eq!(iter.size_hint(), (0, Some(1)));
        iter.next();
        assert_eq!(iter.next(), None);
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }
}
