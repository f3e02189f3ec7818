/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Sparse tight-binding operators on periodic systems, and the Siesta files
//! that carry them.
//!
//! This crate only gathers the workspace members:
//!
//! * [`sparse`]: the physical sparse matrix, `D` values per nonzero.
//! * [`structure`]: lattices, supercell image indexing, and geometries.
//! * [`operator`]: Hamiltonian, overlap and force constants.
//! * [`siesta`]: HSX and FC files.
//!
//! plus a logger for binaries and tests.

pub mod logging;

pub use tbkit_assert_close as assert_close;
pub use tbkit_fs_util as fs_util;
pub use tbkit_operator as operator;
pub use tbkit_siesta_io as siesta;
pub use tbkit_sparse as sparse;
pub use tbkit_structure as structure;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] tbkit_fs_util::Error),

    #[error("could not install the logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
