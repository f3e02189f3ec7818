/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Result, Supercell};

use slice_of_array::prelude::*;
use tbkit_assert_close::{CheckClose, Tolerances};

/// Cell vectors (as rows, in Angstrom) together with the supercell of
/// periodic images that operators on this lattice may couple to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lattice {
    matrix: [[f64; 3]; 3],
    supercell: Supercell,
}

impl Lattice {
    /// Create a lattice from a matrix where the rows are lattice vectors.
    ///
    /// Only the home cell is included; see [`Lattice::with_supercell`].
    pub fn new(matrix: [[f64; 3]; 3]) -> Self
    { Lattice { matrix, supercell: Supercell::gamma() } }

    pub fn with_supercell(matrix: [[f64; 3]; 3], supercell: Supercell) -> Self
    { Lattice { matrix, supercell } }

    /// An orthorhombic lattice ((a, b, c), (90, 90, 90))
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self
    { Lattice::new([[a, 0., 0.], [0., b, 0.], [0., 0., c]]) }

    /// A cubic lattice ((a, a, a), (90, 90, 90))
    pub fn cubic(a: f64) -> Self
    { Lattice::orthorhombic(a, a, a) }

    /// Matrix where lattice vectors are rows.
    #[inline]
    pub fn matrix(&self) -> &[[f64; 3]; 3]
    { &self.matrix }

    #[inline]
    pub fn supercell(&self) -> &Supercell
    { &self.supercell }

    #[inline]
    pub fn nsc(&self) -> [usize; 3]
    { self.supercell.nsc() }

    #[inline]
    pub fn n_s(&self) -> usize
    { self.supercell.n_supercells() }

    /// The same cell vectors with a different supercell.
    pub fn with_nsc(&self, nsc: [usize; 3]) -> Result<Lattice>
    { Ok(Lattice::with_supercell(self.matrix, Supercell::new(nsc)?)) }

    /// Get the (positive) volume of the lattice cell.
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        let cross = [
            b[1] * c[2] - b[2] * c[1],
            b[2] * c[0] - b[0] * c[2],
            b[0] * c[1] - b[1] * c[0],
        ];
        (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]).abs()
    }

    /// Cartesian displacement of a periodic image.
    pub fn image_displacement(&self, offset: [i32; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (&n, row) in offset.iter().zip(&self.matrix) {
            for k in 0..3 {
                out[k] += n as f64 * row[k];
            }
        }
        out
    }

    /// Same supercell, and cell vectors that are close.
    pub fn close_to(&self, other: &Lattice, tol: Tolerances) -> bool {
        self.supercell == other.supercell
            && self.matrix.flat().check_close(other.matrix.flat(), tol).is_ok()
    }
}

impl Default for Lattice {
    fn default() -> Self
    { Lattice::cubic(1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume() {
        assert_close!(Lattice::orthorhombic(2.0, 3.0, 4.0).volume(), 24.0);
        let skew = Lattice::new([[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0, 0.3, 2.0]]);
        assert_close!(skew.volume(), 2.0);
    }

    #[test]
    fn images() {
        let lattice = Lattice::orthorhombic(2.0, 3.0, 4.0).with_nsc([3, 3, 1]).unwrap();
        assert_eq!(lattice.n_s(), 9);
        assert_eq!(lattice.image_displacement([1, -1, 0]), [2.0, -3.0, 0.0]);
        assert!(lattice.with_nsc([3, 2, 1]).is_err());
    }

    #[test]
    fn closeness() {
        let a = Lattice::cubic(3.0);
        let b = Lattice::cubic(3.0 + 1e-12);
        assert!(a.close_to(&b, Tolerances::abs(1e-9)));
        assert!(!a.close_to(&Lattice::cubic(3.1), Tolerances::abs(1e-9)));
        let c = a.with_nsc([3, 1, 1]).unwrap();
        assert!(!a.close_to(&c, Tolerances::abs(1e-9)));
    }
}
