#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the decomposition routines.
pub mod error;

/// Dense matrix container shared by the decomposition routines.
pub mod matrix;

/// Singular value decomposition of general dense matrices.
pub mod svd;

pub use error::SvdError;
pub use matrix::Matrix;
pub use svd::{svd, SvdDecomposition};
