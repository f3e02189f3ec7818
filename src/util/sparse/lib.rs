/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Sparse storage for physical operators.
//!
//! The one type of interest is [`PhysCsr`], a compressed-sparse-row matrix
//! that stores a short vector of `D` values at each nonzero rather than a
//! single scalar. (e.g. one value per spin component plus the overlap)
//!
//! It knows nothing about orbitals or supercells; the operator types layer
//! that meaning on top of it.

#[macro_use]
mod macros;

mod csr;

pub use crate::csr::{PhysCsr, RowView};
pub use tbkit_assert_close::Tolerances;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("row {row} is out of range for a matrix with {nrows} rows")]
    RowOutOfRange { row: usize, nrows: usize },

    #[error("column {col} is out of range for a matrix with {ncols} columns")]
    ColOutOfRange { col: usize, ncols: usize },

    #[error("value index {d} is out of range (D = {dim})")]
    DimOutOfRange { d: usize, dim: usize },

    #[error("expected {expected} values per nonzero, got {found}")]
    DimMismatch { expected: usize, found: usize },

    #[error("the number of values per nonzero has not been fixed yet")]
    DimUnset,

    #[error("a sparse matrix must store at least one value per nonzero")]
    ZeroDim,

    #[error("inconsistent sparse data: {0}")]
    BadParts(String),
}

impl Error {
    /// Errors about the extents of the stored data (`ShapeError` in the
    /// taxonomy shared by the other crates), as opposed to a bad index.
    pub fn is_shape_error(&self) -> bool {
        match self {
            Error::DimMismatch { .. } | Error::DimUnset | Error::ZeroDim | Error::BadParts(_) => true,
            Error::RowOutOfRange { .. } | Error::ColOutOfRange { .. } | Error::DimOutOfRange { .. } => false,
        }
    }

    pub fn is_index_error(&self) -> bool
    { !self.is_shape_error() }
}

pub type Result<T> = std::result::Result<T, Error>;
