//! # csfkit - Compressed Sparse Fiber trees for sparse tensors
//!
//! This is the **meta crate** that re-exports the csfkit components for convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use csfkit::prelude::*;
//!
//! let mut coo = CooTensor::zeros(vec![3, 4, 5])?;
//! coo.push(vec![2, 0, 1], 3.0)?;
//! coo.push(vec![0, 1, 2], 1.0)?;
//! coo.sort();
//!
//! let csf = CsfTensor::from_coo(&coo)?;
//! assert_eq!(csf.indlen(), &[3, 2, 2]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Sparse Tensors ([`sparse`])
//!
//! COO tensors, the [`CooSource`](sparse::CooSource) input trait, and CSF
//! construction and traversal.
//!
//! ```
//! use csfkit::sparse::{CooTensor, CsfBuilder};
//!
//! let coo = CooTensor::new(vec![vec![0, 1], vec![1, 0]], vec![1.0, 2.0], vec![2, 2]).unwrap();
//! let csf = CsfBuilder::unchecked().build(&coo).unwrap();
//! assert_eq!(csf.nnz(), 2);
//! ```
//!
//! ## Features
//!
//! - `csf` (default): CSF construction and traversal
//! - `parallel`: Build CSF levels in parallel for large inputs

// Re-export all components
pub use csfkit_sparse as sparse;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use csfkit::prelude::*;
    //!
    //! let coo = CooTensor::<f64>::zeros(vec![10, 20, 30]).unwrap();
    //! assert_eq!(coo.shape(), &[10, 20, 30]);
    //! ```

    // Sparse types
    pub use crate::sparse::{CooSource, CooTensor, SparseError, SparseResult};

    // CSF
    #[cfg(feature = "csf")]
    pub use crate::sparse::{CsfBuilder, CsfError, CsfTensor};
}
