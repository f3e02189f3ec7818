/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Element, Error, Lattice, Result, Supercell};

use std::ops::Range;

use itertools::izip;
use tbkit_assert_close::{CheckClose, Tolerances};

/// An atom as far as an operator is concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    /// Atomic number. Siesta marks ghost atoms (basis only) with a negative value.
    pub z: i32,
    /// Number of orbitals in this atom's basis.
    pub orbitals: usize,
}

impl Atom {
    pub fn new(z: i32, orbitals: usize) -> Self
    { Atom { z, orbitals } }

    pub fn is_ghost(&self) -> bool
    { self.z < 0 }

    pub fn element(&self) -> Option<Element>
    { Element::from_atomic_number(self.z.unsigned_abs()) }
}

/// Atoms, their cartesian positions (Angstrom), and the lattice.
///
/// Orbitals are numbered atom by atom: the orbitals of atom `ia` are
/// `firsto()[ia]..firsto()[ia + 1]`.
///
/// This is shared by operators through an `Arc` and is never modified in place;
/// the `with_*` methods produce new geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    lattice: Lattice,
    xyz: Vec<[f64; 3]>,
    atoms: Vec<Atom>,
    // na + 1 cumulative orbital counts
    firsto: Vec<usize>,
}

impl Geometry {
    pub fn new(lattice: Lattice, xyz: Vec<[f64; 3]>, atoms: Vec<Atom>) -> Result<Self> {
        if xyz.len() != atoms.len() {
            return Err(Error::LengthMismatch { what: "positions", expected: atoms.len(), found: xyz.len() });
        }
        let firsto = cumulative(atoms.iter().map(|a| a.orbitals));
        Ok(Geometry { lattice, xyz, atoms, firsto })
    }

    /// Number of atoms.
    #[inline]
    pub fn na(&self) -> usize
    { self.atoms.len() }

    /// Number of orbitals in the unit cell.
    #[inline]
    pub fn no(&self) -> usize
    { self.firsto[self.atoms.len()] }

    /// Number of periodic images.
    #[inline]
    pub fn n_s(&self) -> usize
    { self.lattice.n_s() }

    #[inline]
    pub fn nsc(&self) -> [usize; 3]
    { self.lattice.nsc() }

    #[inline]
    pub fn lattice(&self) -> &Lattice
    { &self.lattice }

    #[inline]
    pub fn supercell(&self) -> &Supercell
    { self.lattice.supercell() }

    pub fn xyz(&self) -> &[[f64; 3]]
    { &self.xyz }

    pub fn atoms(&self) -> &[Atom]
    { &self.atoms }

    /// Atomic numbers.
    pub fn species(&self) -> Vec<i32>
    { self.atoms.iter().map(|a| a.z).collect() }

    pub fn orbital_counts(&self) -> Vec<usize>
    { self.atoms.iter().map(|a| a.orbitals).collect() }

    /// First orbital of each atom, followed by `no()`.
    pub fn firsto(&self) -> &[usize]
    { &self.firsto }

    pub fn orbitals_of(&self, atom: usize) -> Range<usize>
    { self.firsto[atom]..self.firsto[atom + 1] }

    /// The atom that owns a unit cell orbital.
    pub fn atom_of_orbital(&self, orbital: usize) -> Option<usize> {
        if orbital >= self.no() {
            return None;
        }
        // last atom whose first orbital is <= orbital (skipping atoms without orbitals)
        match self.firsto.binary_search(&orbital) {
            Ok(mut i) => {
                while self.firsto[i + 1] == orbital {
                    i += 1;
                }
                Some(i)
            },
            Err(i) => Some(i - 1),
        }
    }

    /// The same atoms with different basis sizes.
    pub fn with_orbital_counts(&self, counts: &[usize]) -> Result<Geometry> {
        if counts.len() != self.na() {
            return Err(Error::LengthMismatch { what: "orbital counts", expected: self.na(), found: counts.len() });
        }
        let atoms = izip!(&self.atoms, counts)
            .map(|(atom, &orbitals)| Atom { orbitals, ..*atom })
            .collect();
        Geometry::new(self.lattice.clone(), self.xyz.clone(), atoms)
    }

    /// The same geometry coupled to a different set of periodic images.
    pub fn with_nsc(&self, nsc: [usize; 3]) -> Result<Geometry> {
        if nsc != self.nsc() {
            debug!("changing supercell of geometry from {} to {:?}", self.supercell(), nsc);
        }
        Ok(Geometry {
            lattice: self.lattice.with_nsc(nsc)?,
            ..self.clone()
        })
    }

    /// Same atoms and supercell, with lattice and positions close.
    pub fn close_to(&self, other: &Geometry, tol: Tolerances) -> bool {
        self.atoms == other.atoms
            && self.lattice.close_to(&other.lattice, tol)
            && izip!(&self.xyz, &other.xyz).all(|(a, b)| a.check_close(b, tol).is_ok())
    }
}

fn cumulative(counts: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out = vec![0];
    let mut total = 0;
    for n in counts {
        total += n;
        out.push(total);
    }
    out
}
