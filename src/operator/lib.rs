/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Physical operators: sparse matrices with a geometry attached.
//!
//! Each operator pairs a [`PhysCsr`] of shape `(no, no * n_s)` with the
//! [`Geometry`] it was built for. The geometry is shared behind an `Arc`
//! and never modified once attached.
//!
//! [`PhysCsr`]: tbkit_sparse::PhysCsr
//! [`Geometry`]: tbkit_structure::Geometry

#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate tbkit_assert_close;

mod force_constants;
mod hamiltonian;
mod overlap;
mod spin;

pub use crate::force_constants::{ForceConstants, DIRECTIONS};
pub use crate::hamiltonian::Hamiltonian;
pub use crate::overlap::Overlap;
pub use crate::spin::Spin;

pub use tbkit_assert_close::Tolerances;

use tbkit_sparse::PhysCsr;
use tbkit_structure::Geometry;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sparse(#[from] tbkit_sparse::Error),

    #[error(transparent)]
    Structure(#[from] tbkit_structure::Error),

    #[error("a {}x{} matrix does not fit a geometry with {no} orbitals and {n_s} images", .shape.0, .shape.1)]
    GeometryMismatch { no: usize, n_s: usize, shape: (usize, usize) },

    #[error("expected {expected} values per nonzero, found {found:?}")]
    DimMismatch { expected: usize, found: Option<usize> },

    #[error("unsupported number of spin components: {0}")]
    InvalidSpin(usize),

    #[error("{0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// shape and D of a matrix about to be attached to a geometry
fn check_attach(geometry: &Geometry, csr: &PhysCsr, dim: usize) -> Result<()> {
    let (no, n_s) = (geometry.no(), geometry.n_s());
    if csr.shape() != (no, no * n_s) {
        return Err(Error::GeometryMismatch { no, n_s, shape: csr.shape() });
    }
    if csr.dim() != Some(dim) {
        return Err(Error::DimMismatch { expected: dim, found: csr.dim() });
    }
    Ok(())
}

// the geometric part of operator equality; positions are not compared
fn same_layout(a: &Geometry, b: &Geometry) -> bool {
    a.no() == b.no() && a.nsc() == b.nsc()
}
