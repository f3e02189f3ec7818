/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Error, Result};

use std::fmt;

/// Spin configuration of a Hamiltonian, which decides how many of its
/// values per nonzero are energies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Spin {
    /// One component.
    Unpolarized,
    /// Up and down.
    Polarized,
    /// Four components: up-up, down-down, and the real/imaginary parts of up-down.
    NonColinear,
    /// Eight components: the full complex 2x2 spin block.
    SpinOrbit,
}

impl Spin {
    pub fn from_nspin(nspin: usize) -> Result<Spin> {
        match nspin {
            1 => Ok(Spin::Unpolarized),
            2 => Ok(Spin::Polarized),
            4 => Ok(Spin::NonColinear),
            8 => Ok(Spin::SpinOrbit),
            n => Err(Error::InvalidSpin(n)),
        }
    }

    /// Number of Hamiltonian components.
    pub fn nspin(&self) -> usize {
        match self {
            Spin::Unpolarized => 1,
            Spin::Polarized => 2,
            Spin::NonColinear => 4,
            Spin::SpinOrbit => 8,
        }
    }

    /// Components that lie on the diagonal of the spin block.
    ///
    /// These are the ones an energy shift applies to.
    pub fn diagonal(&self) -> &'static [usize] {
        match self {
            Spin::Unpolarized => &[0],
            _ => &[0, 1],
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Spin::Unpolarized => "unpolarized",
            Spin::Polarized => "polarized",
            Spin::NonColinear => "non-colinear",
            Spin::SpinOrbit => "spin-orbit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nspin() {
        for &n in &[1, 2, 4, 8] {
            assert_eq!(Spin::from_nspin(n).unwrap().nspin(), n);
        }
        assert_eq!(Spin::from_nspin(3), Err(Error::InvalidSpin(3)));
        assert_eq!(Spin::Unpolarized.diagonal(), &[0]);
        assert_eq!(Spin::SpinOrbit.diagonal(), &[0, 1]);
    }
}
