//! # csfkit-sparse
//!
//! Sparse tensor formats for csfkit.
//!
//! This crate provides:
//! - COO (Coordinate) format and the [`CooSource`] input trait
//! - CSF (Compressed Sparse Fiber) trees built from sorted COO - feature-gated
//! - Leaf-order traversal of CSF trees
//! - Parallel CSF construction - `parallel` feature
//!
//! # Example
//!
//! ```
//! use csfkit_sparse::{CooTensor, CsfTensor};
//!
//! let coo = CooTensor::new(
//!     vec![
//!         vec![0, 0, 0, 0, 0, 1, 1, 1],
//!         vec![0, 0, 1, 1, 1, 1, 1, 1],
//!         vec![0, 0, 0, 0, 1, 1, 1, 1],
//!         vec![1, 2, 0, 2, 0, 0, 1, 2],
//!     ],
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
//!     vec![2, 2, 2, 3],
//! ).unwrap();
//!
//! let csf = CsfTensor::from_coo(&coo).unwrap();
//! assert_eq!(csf.indptr(0), Some(&[0, 2, 3][..]));
//! assert_eq!(csf.indptr(1), Some(&[0, 1, 3, 4][..]));
//! assert_eq!(csf.indptr(2), Some(&[0, 2, 4, 5, 8][..]));
//! assert_eq!(csf.to_string(), "<CSF: shape=[2, 2, 2, 3], nnz=8>");
//! ```

pub mod coo;
#[cfg(feature = "csf")]
pub mod csf;
pub mod error;
#[cfg(feature = "csf")]
pub mod iterators;
#[cfg(feature = "csf")]
pub mod parallel;

// Re-exports
pub use coo::*;
#[cfg(feature = "csf")]
pub use csf::*;
pub use error::*;
#[cfg(feature = "csf")]
pub use iterators::*;
