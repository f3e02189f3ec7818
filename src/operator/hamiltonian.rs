/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Overlap, Result, Spin, Tolerances};

use std::sync::Arc;

use tbkit_sparse::PhysCsr;
use tbkit_structure::Geometry;

/// A Hamiltonian, optionally stored together with the overlap of a
/// non-orthogonal basis.
///
/// Each nonzero stores `nspin` energies (eV) followed, for a non-orthogonal
/// basis, by the overlap. So `D = nspin + 1` and the overlap lives at
/// `S_idx = nspin`; an orthogonal Hamiltonian has `D = nspin` and no `S_idx`.
#[derive(Debug, Clone)]
pub struct Hamiltonian {
    geometry: Arc<Geometry>,
    csr: PhysCsr,
    spin: Spin,
    orthogonal: bool,
}

impl Hamiltonian {
    /// An empty Hamiltonian.
    pub fn new(geometry: Arc<Geometry>, spin: Spin, orthogonal: bool) -> Result<Self> {
        let no = geometry.no();
        let dim = Self::dim_for(spin, orthogonal);
        let csr = PhysCsr::new((no, no * geometry.n_s()), dim)?;
        Ok(Hamiltonian { geometry, csr, spin, orthogonal })
    }

    /// Attach an existing matrix, whose shape and `D` must fit.
    pub fn from_csr(geometry: Arc<Geometry>, csr: PhysCsr, spin: Spin, orthogonal: bool) -> Result<Self> {
        crate::check_attach(&geometry, &csr, Self::dim_for(spin, orthogonal))?;
        Ok(Hamiltonian { geometry, csr, spin, orthogonal })
    }

    fn dim_for(spin: Spin, orthogonal: bool) -> usize
    { spin.nspin() + if orthogonal { 0 } else { 1 } }

    pub fn geometry(&self) -> &Arc<Geometry>
    { &self.geometry }

    pub fn csr(&self) -> &PhysCsr
    { &self.csr }

    pub fn into_csr(self) -> PhysCsr
    { self.csr }

    pub fn spin(&self) -> Spin
    { self.spin }

    pub fn is_orthogonal(&self) -> bool
    { self.orthogonal }

    /// Values per nonzero.
    pub fn dim(&self) -> usize
    { Self::dim_for(self.spin, self.orthogonal) }

    /// Which value of each nonzero is the overlap.
    pub fn s_idx(&self) -> Option<usize> {
        match self.orthogonal {
            true => None,
            false => Some(self.spin.nspin()),
        }
    }

    pub fn no(&self) -> usize
    { self.geometry.no() }

    pub fn n_s(&self) -> usize
    { self.geometry.n_s() }

    pub fn nnz(&self) -> usize
    { self.csr.nnz() }

    /// All `D` values coupling orbital `io` of the home cell to orbital `jo` of image `offset`.
    pub fn get(&self, io: usize, jo: usize, offset: [i32; 3]) -> Result<Option<&[f64]>> {
        let col = self.geometry.supercell().column(jo, offset, self.no())?;
        Ok(self.csr.get(io, col)?)
    }

    pub fn set(&mut self, io: usize, jo: usize, offset: [i32; 3], values: &[f64]) -> Result<()> {
        let col = self.geometry.supercell().column(jo, offset, self.no())?;
        self.csr.set(io, col, values)?;
        Ok(())
    }

    pub fn finalize(&mut self)
    { self.csr.finalize() }

    /// Add `energy` to every stored value of the spin-diagonal components.
    ///
    /// The overlap is never touched. Since the overlap is not applied,
    /// this moves the eigenvalues by `energy` only for an orthogonal basis
    /// or for a shift that is matched by the file it was read from.
    pub fn shift(&mut self, energy: f64) -> Result<()> {
        if self.csr.nnz() == 0 {
            return Ok(());
        }
        trace!("shifting {} Hamiltonian by {} eV", self.spin, energy);
        for &d in self.spin.diagonal() {
            self.csr.transform(d, |x| x + energy)?;
        }
        Ok(())
    }

    /// The overlap as an operator of its own, with the same sparsity.
    ///
    /// An orthogonal Hamiltonian yields the identity.
    pub fn extract_overlap(&self) -> Result<Overlap> {
        match self.s_idx() {
            Some(s_idx) => {
                let csr = self.csr.select_dims(&[s_idx])?;
                Overlap::from_csr(self.geometry.clone(), csr)
            },
            None => Overlap::identity(self.geometry.clone()),
        }
    }

    /// Same spin, basis type, orbitals, supercell and sparsity, with values
    /// close within `tol`.
    pub fn close_to(&self, other: &Hamiltonian, tol: Tolerances) -> bool {
        self.spin == other.spin
            && self.orthogonal == other.orthogonal
            && crate::same_layout(&self.geometry, &other.geometry)
            && self.csr.close_to(&other.csr, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use rand::Rng;
    use tbkit_structure::{Atom, Lattice};

    fn dimer(nsc: [usize; 3]) -> Arc<Geometry> {
        let lattice = Lattice::orthorhombic(3.0, 10.0, 10.0).with_nsc(nsc).unwrap();
        let atoms = vec![Atom::new(6, 2), Atom::new(7, 3)];
        Arc::new(Geometry::new(lattice, vec![[0.0; 3], [1.4, 0.0, 0.0]], atoms).unwrap())
    }

    fn random_h(spin: Spin) -> Hamiltonian {
        let mut rng = rand::thread_rng();
        let mut h = Hamiltonian::new(dimer([3, 1, 1]), spin, false).unwrap();
        let no = h.no();
        let dim = h.dim();
        for io in 0..no {
            for jo in 0..no {
                for &offset in &[[0, 0, 0], [1, 0, 0], [-1, 0, 0]] {
                    if rng.gen_range(0, 3) == 0 {
                        let values = (0..dim).map(|_| rng.next_f64()).collect::<Vec<_>>();
                        h.set(io, jo, offset, &values).unwrap();
                    }
                }
            }
        }
        h
    }

    #[test]
    fn layout() {
        let h = Hamiltonian::new(dimer([3, 1, 3]), Spin::Polarized, false).unwrap();
        assert_eq!(h.csr().shape(), (5, 45));
        assert_eq!(h.dim(), 3);
        assert_eq!(h.s_idx(), Some(2));

        let h = Hamiltonian::new(dimer([1, 1, 1]), Spin::NonColinear, true).unwrap();
        assert_eq!(h.dim(), 4);
        assert_eq!(h.s_idx(), None);
    }

    #[test]
    fn from_csr_checks() {
        let geom = dimer([3, 1, 1]);
        let ok = PhysCsr::new((5, 15), 2).unwrap();
        assert!(Hamiltonian::from_csr(geom.clone(), ok, Spin::Unpolarized, false).is_ok());

        let wrong_dim = PhysCsr::new((5, 15), 2).unwrap();
        assert_eq!(
            Hamiltonian::from_csr(geom.clone(), wrong_dim, Spin::Polarized, false).unwrap_err(),
            Error::DimMismatch { expected: 3, found: Some(2) },
        );
        let wrong_shape = PhysCsr::new((5, 5), 2).unwrap();
        assert!(Hamiltonian::from_csr(geom, wrong_shape, Spin::Unpolarized, false).is_err());
    }

    #[test]
    fn shift_and_back() {
        for &spin in &[Spin::Unpolarized, Spin::Polarized, Spin::NonColinear] {
            let mut h = random_h(spin);
            let orig = h.clone();
            let s_idx = h.s_idx().unwrap();

            h.shift(1.5).unwrap();
            for ((_, _, new), (_, _, old)) in h.csr().iter().zip(orig.csr().iter()) {
                for d in 0..h.dim() {
                    match spin.diagonal().contains(&d) {
                        true => assert_close!(abs=1e-12, new[d], old[d] + 1.5),
                        false => assert_eq!(new[d].to_bits(), old[d].to_bits()),
                    }
                }
            }

            h.shift(-1.5).unwrap();
            assert!(h.close_to(&orig, Tolerances::abs(1e-12)));
            for ((_, _, new), (_, _, old)) in h.csr().iter().zip(orig.csr().iter()) {
                assert_eq!(new[s_idx].to_bits(), old[s_idx].to_bits());
            }
        }
    }

    #[test]
    fn shift_empty_is_noop() {
        let mut h = Hamiltonian::new(dimer([1, 1, 1]), Spin::Unpolarized, false).unwrap();
        h.shift(3.0).unwrap();
        assert_eq!(h.nnz(), 0);
    }

    #[test]
    fn extract_overlap() {
        let h = random_h(Spin::Polarized);
        let s = h.extract_overlap().unwrap();
        assert!(s.csr().same_sparsity(h.csr()));
        for ((r, c, hv), (r2, c2, sv)) in h.csr().iter().zip(s.csr().iter()) {
            assert_eq!((r, c), (r2, c2));
            assert_eq!(sv, &hv[2..3]);
        }

        let mut orth = Hamiltonian::new(dimer([3, 1, 1]), Spin::Unpolarized, true).unwrap();
        orth.set(0, 1, [1, 0, 0], &[-2.7]).unwrap();
        let s = orth.extract_overlap().unwrap();
        assert_eq!(s.nnz(), 5);
        assert_eq!(s.get(4, 4, [0, 0, 0]).unwrap(), Some(1.0));
    }

    #[test]
    fn close_to() {
        let h = random_h(Spin::Unpolarized);
        let mut other = h.clone();
        assert!(h.close_to(&other, Tolerances::default()));

        let (r, c, v) = other.csr().iter().next().map(|(r, c, v)| (r, c, v.to_vec())).unwrap();
        let mut bumped = v.clone();
        bumped[0] += 1e-6;
        other.csr = {
            let mut csr = other.csr().clone();
            csr.set(r, c, &bumped).unwrap();
            csr
        };
        assert!(!h.close_to(&other, Tolerances::abs(1e-9)));
        assert!(h.close_to(&other, Tolerances::abs(1e-5)));

        let polarized = random_h(Spin::Polarized);
        assert!(!h.close_to(&polarized, Tolerances::abs(1e9)));
    }
}
