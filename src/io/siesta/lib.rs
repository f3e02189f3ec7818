/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Siesta file formats.
//!
//! * `*.HSX`: Hamiltonian and overlap, Fortran unformatted binary. Versions 0 and 1.
//! * `*.FC`, `*.FCC`: force constants from finite displacements, plain text.
//!
//! Each format is a "sile": an object bound to one path that implements
//! whichever [`Sile`] operations the format can support. Use a
//! [`SileRegistry`] to pick the sile from a file name.
//!
//! Every reader accepts gzipped files; all values are returned in eV and Angstrom.

#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate tbkit_assert_close;

pub mod units;
mod fc;
mod fortran;
mod hsx;
mod settings;
mod sile;

pub use crate::fc::{write_force_constant, FcSile, Forces, DEFAULT_DISPLACEMENT_BOHR};
pub use crate::hsx::{write_hsx, HsxHeader, HsxSile, HsxWriteOptions, Precision};
pub use crate::settings::{ReadSettings, YamlRead};
pub use crate::sile::{Sile, SileConstructor, SileRegistry};
pub use crate::units::UnitError;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] tbkit_fs_util::Error),

    #[error(transparent)]
    RawIo(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported HSX version {0}")]
    UnsupportedVersion(i32),

    #[error("{0}")]
    Shape(String),

    #[error("incompatible geometry: {0}")]
    IncompatibleGeometry(String),

    #[error("'{}' carries no geometry, and none was supplied", .0.display())]
    MissingGeometry(PathBuf),

    #[error("'{}' does not contain a Fermi level", .0.display())]
    MissingFermiLevel(PathBuf),

    #[error("{format} files do not support {operation}")]
    Unsupported { format: &'static str, operation: &'static str },

    #[error("no sile is registered for '{}'", .0.display())]
    UnknownExtension(PathBuf),

    #[error(transparent)]
    Operator(#[from] tbkit_operator::Error),

    #[error(transparent)]
    Sparse(#[from] tbkit_sparse::Error),

    #[error(transparent)]
    Structure(#[from] tbkit_structure::Error),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Malformed or truncated input.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::UnsupportedVersion(_))
    }

    /// Dimensions or counts that do not fit together.
    pub fn is_shape_error(&self) -> bool {
        match self {
            Error::Shape(_) => true,
            Error::Sparse(e) => e.is_shape_error(),
            Error::Operator(tbkit_operator::Error::Shape(_)) => true,
            Error::Operator(tbkit_operator::Error::DimMismatch { .. }) => true,
            Error::Operator(tbkit_operator::Error::GeometryMismatch { .. }) => true,
            _ => false,
        }
    }
}
