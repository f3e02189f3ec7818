/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The geometry side of a physical operator.
//!
//! [`Geometry`] is deliberately small: it records what a sparse operator needs
//! to know about the system (species, orbitals per atom, positions, and the
//! lattice with its supercell) and nothing else.

#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate tbkit_assert_close;

mod element;
mod geometry;
mod lattice;
mod supercell;

pub use crate::element::{Element, ElementParseError};
pub use crate::geometry::{Atom, Geometry};
pub use crate::lattice::Lattice;
pub use crate::supercell::Supercell;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid supercell {nsc:?}: every entry must be odd, and the image count must fit in a usize")]
    InvalidNsc { nsc: [usize; 3] },

    #[error("image offset {offset:?} lies outside of supercell {nsc:?}")]
    OffsetOutOfRange { offset: [i32; 3], nsc: [usize; 3] },

    #[error("supercell index {index} is out of range ({n_supercells} images)")]
    ScIndexOutOfRange { index: usize, n_supercells: usize },

    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch { what: &'static str, expected: usize, found: usize },
}

impl Error {
    /// An index or offset outside of the supercell, as opposed to bad input data.
    pub fn is_domain_error(&self) -> bool {
        match self {
            Error::InvalidNsc { .. }
            | Error::OffsetOutOfRange { .. }
            | Error::ScIndexOutOfRange { .. } => true,
            Error::LengthMismatch { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
