/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Result, Tolerances};

use std::sync::Arc;

use tbkit_sparse::PhysCsr;
use tbkit_structure::Geometry;

/// Overlap matrix of a non-orthogonal basis. One value per nonzero.
#[derive(Debug, Clone)]
pub struct Overlap {
    geometry: Arc<Geometry>,
    csr: PhysCsr,
}

impl Overlap {
    /// An empty overlap matrix.
    pub fn new(geometry: Arc<Geometry>) -> Result<Self> {
        let no = geometry.no();
        let csr = PhysCsr::new((no, no * geometry.n_s()), 1)?;
        Ok(Overlap { geometry, csr })
    }

    /// The overlap of an orthonormal basis: ones on the home cell diagonal.
    pub fn identity(geometry: Arc<Geometry>) -> Result<Self> {
        let no = geometry.no();
        let mut csr = PhysCsr::with_row_capacity((no, no * geometry.n_s()), 1, 1)?;
        for io in 0..no {
            csr.set(io, io, &[1.0])?;
        }
        Ok(Overlap { geometry, csr })
    }

    pub fn from_csr(geometry: Arc<Geometry>, csr: PhysCsr) -> Result<Self> {
        crate::check_attach(&geometry, &csr, 1)?;
        Ok(Overlap { geometry, csr })
    }

    pub fn geometry(&self) -> &Arc<Geometry>
    { &self.geometry }

    pub fn csr(&self) -> &PhysCsr
    { &self.csr }

    pub fn into_csr(self) -> PhysCsr
    { self.csr }

    pub fn no(&self) -> usize
    { self.geometry.no() }

    pub fn nnz(&self) -> usize
    { self.csr.nnz() }

    /// Overlap between orbital `io` of the home cell and orbital `jo` of image `offset`.
    pub fn get(&self, io: usize, jo: usize, offset: [i32; 3]) -> Result<Option<f64>> {
        let col = self.geometry.supercell().column(jo, offset, self.no())?;
        Ok(self.csr.get(io, col)?.map(|v| v[0]))
    }

    pub fn set(&mut self, io: usize, jo: usize, offset: [i32; 3], value: f64) -> Result<()> {
        let col = self.geometry.supercell().column(jo, offset, self.no())?;
        self.csr.set(io, col, &[value])?;
        Ok(())
    }

    pub fn finalize(&mut self)
    { self.csr.finalize() }

    /// Same orbitals, supercell and sparsity, with values close within `tol`.
    pub fn close_to(&self, other: &Overlap, tol: Tolerances) -> bool {
        crate::same_layout(&self.geometry, &other.geometry)
            && self.csr.close_to(&other.csr, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbkit_structure::{Atom, Lattice};

    fn chain() -> Arc<Geometry> {
        let lattice = Lattice::cubic(2.0).with_nsc([3, 1, 1]).unwrap();
        let atoms = vec![Atom::new(6, 2)];
        Arc::new(Geometry::new(lattice, vec![[0.0; 3]], atoms).unwrap())
    }

    #[test]
    fn identity() {
        let s = Overlap::identity(chain()).unwrap();
        assert_eq!(s.nnz(), 2);
        assert_eq!(s.get(1, 1, [0, 0, 0]).unwrap(), Some(1.0));
        assert_eq!(s.get(1, 0, [0, 0, 0]).unwrap(), None);
        assert_eq!(s.get(1, 1, [1, 0, 0]).unwrap(), None);
    }

    #[test]
    fn set_through_images() {
        let mut s = Overlap::new(chain()).unwrap();
        s.set(0, 1, [-1, 0, 0], 0.25).unwrap();
        // [-1, 0, 0] is image 2
        assert_eq!(s.csr().get(0, 5).unwrap(), Some(&[0.25][..]));
        assert_eq!(s.get(0, 1, [-1, 0, 0]).unwrap(), Some(0.25));
        assert!(s.set(0, 1, [2, 0, 0], 1.0).is_err());
    }

    #[test]
    fn attach_checks_shape() {
        assert!(Overlap::from_csr(chain(), PhysCsr::new((2, 6), 1).unwrap()).is_ok());
        assert!(Overlap::from_csr(chain(), PhysCsr::new((2, 2), 1).unwrap()).is_err());
        assert!(Overlap::from_csr(chain(), PhysCsr::new((2, 6), 2).unwrap()).is_err());
    }
}
