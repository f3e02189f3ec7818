/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Error, Result};

use std::fmt;

/// The periodic images of the unit cell that an operator may couple to.
///
/// `nsc[k]` images are kept along lattice vector `k`, centered on the home
/// cell, so every entry is odd.
///
/// # Image ordering
///
/// Images are numbered by a flat "supercell index". Along one axis the
/// offsets are visited in the order `0, +1, -1, +2, -2, ...`; the flat index
/// nests the axes with `a` varying slowest and `c` fastest. Thus the home cell
/// `[0, 0, 0]` is always index 0.
///
/// File formats that store supercell columns (e.g. HSX) use this same order,
/// so it must never change.
///
/// A column of an operator on `no` orbitals is `sc_index(offset) * no + j`
/// for local orbital `j`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Supercell {
    nsc: [usize; 3],
}

impl Default for Supercell {
    fn default() -> Self
    { Supercell::gamma() }
}

impl fmt::Display for Supercell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.nsc;
        write!(f, "{}x{}x{}", a, b, c)
    }
}

impl Supercell {
    /// Fails if any entry is even, or if there are more images than fit in a `usize`.
    pub fn new(nsc: [usize; 3]) -> Result<Self> {
        if nsc.iter().any(|&n| n % 2 == 0) {
            return Err(Error::InvalidNsc { nsc });
        }
        if nsc.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n)).is_none() {
            return Err(Error::InvalidNsc { nsc });
        }
        Ok(Supercell { nsc })
    }

    /// Only the home cell.
    pub fn gamma() -> Self
    { Supercell { nsc: [1, 1, 1] } }

    #[inline]
    pub fn nsc(&self) -> [usize; 3]
    { self.nsc }

    /// Total number of images.
    #[inline]
    pub fn n_supercells(&self) -> usize
    { self.nsc.iter().product() }

    /// The largest offset magnitude along each axis.
    pub fn max_offset(&self) -> [i32; 3] {
        let [a, b, c] = self.nsc;
        [(a / 2) as i32, (b / 2) as i32, (c / 2) as i32]
    }

    pub fn contains(&self, offset: [i32; 3]) -> bool {
        let max = self.max_offset();
        (0..3).all(|k| offset[k].abs() <= max[k])
    }

    /// Flat index of an image.
    pub fn sc_index(&self, offset: [i32; 3]) -> Result<usize> {
        if !self.contains(offset) {
            return Err(Error::OffsetOutOfRange { offset, nsc: self.nsc });
        }
        let [_, nb, nc] = self.nsc;
        let [ia, ib, ic] = [axis_index(offset[0]), axis_index(offset[1]), axis_index(offset[2])];
        Ok((ia * nb + ib) * nc + ic)
    }

    /// Image offset of a flat index. Inverse of [`Supercell::sc_index`].
    pub fn offset_of(&self, index: usize) -> Result<[i32; 3]> {
        if index >= self.n_supercells() {
            return Err(Error::ScIndexOutOfRange { index, n_supercells: self.n_supercells() });
        }
        Ok(self.offset_unchecked(index))
    }

    /// All image offsets, in index order.
    pub fn offsets(&self) -> impl Iterator<Item = [i32; 3]> + '_
    { (0..self.n_supercells()).map(move |i| self.offset_unchecked(i)) }

    /// Column of local orbital `local` in image `offset`, for an operator on `no` orbitals.
    pub fn column(&self, local: usize, offset: [i32; 3], no: usize) -> Result<usize> {
        debug_assert!(local < no);
        Ok(self.sc_index(offset)? * no + local)
    }

    /// Split a column into its local orbital and its image offset.
    pub fn split_column(&self, col: usize, no: usize) -> Result<(usize, [i32; 3])> {
        if no == 0 {
            return Err(Error::ScIndexOutOfRange { index: col, n_supercells: 0 });
        }
        let offset = self.offset_of(col / no)?;
        Ok((col % no, offset))
    }

    fn offset_unchecked(&self, index: usize) -> [i32; 3] {
        let [_, nb, nc] = self.nsc;
        let ic = index % nc;
        let ib = (index / nc) % nb;
        let ia = index / (nc * nb);
        [axis_offset(ia), axis_offset(ib), axis_offset(ic)]
    }
}

// 0, +1, -1, +2, -2, ...  =>  0, 1, 2, 3, 4, ...
fn axis_index(offset: i32) -> usize {
    match offset {
        0 => 0,
        o if o > 0 => 2 * o as usize - 1,
        o => 2 * o.unsigned_abs() as usize,
    }
}

fn axis_offset(index: usize) -> i32 {
    match index % 2 {
        1 => ((index + 1) / 2) as i32,
        _ => -((index / 2) as i32),
    }
}
