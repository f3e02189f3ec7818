/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

// Each test binary uses a different subset of these.
#![allow(dead_code)]

use std::sync::Arc;

use rand::Rng;
use tbkit::operator::{Hamiltonian, Spin};
use tbkit::structure::{Atom, Geometry, Lattice, Supercell};

/// Two-atom hexagonal cell, with 4 and 1 orbitals.
pub fn geometry(nsc: [usize; 3]) -> Geometry {
    let a = 2.46;
    let lattice = Lattice::with_supercell(
        [[a, 0.0, 0.0], [-0.5 * a, 0.5 * 3f64.sqrt() * a, 0.0], [0.0, 0.0, 15.0]],
        Supercell::new(nsc).unwrap(),
    );
    Geometry::new(
        lattice,
        vec![[0.0, 0.0, 7.5], [0.0, a / 3f64.sqrt(), 7.5]],
        vec![Atom::new(6, 4), Atom::new(1, 1)],
    ).unwrap()
}

/// A finalized, non-orthogonal Hamiltonian with a random sparsity pattern.
///
/// Every home-cell diagonal element is present.
pub fn random_hamiltonian(geometry: Geometry, spin: Spin) -> Hamiltonian {
    let mut rng = rand::thread_rng();
    let geometry = Arc::new(geometry);
    let offsets = geometry.supercell().offsets().collect::<Vec<_>>();
    let no = geometry.no();
    let dim = spin.nspin() + 1;

    let mut ham = Hamiltonian::new(geometry.clone(), spin, false).unwrap();
    let mut values = |diagonal: bool| {
        let mut v = (0..dim).map(|_| 10.0 * rng.next_f64() - 5.0).collect::<Vec<_>>();
        v[dim - 1] = if diagonal { 1.0 } else { 0.2 * rng.next_f64() };
        v
    };
    for io in 0..no {
        ham.set(io, io, [0, 0, 0], &values(true)).unwrap();
    }
    for _ in 0..4 * no {
        let io = rand::thread_rng().gen_range(0, no);
        let jo = rand::thread_rng().gen_range(0, no);
        let offset = offsets[rand::thread_rng().gen_range(0, offsets.len())];
        if io == jo && offset == [0, 0, 0] {
            continue;
        }
        ham.set(io, jo, offset, &values(false)).unwrap();
    }
    ham.finalize();
    ham
}

pub fn tempdir() -> tempdir::TempDir
{ tempdir::TempDir::new("tbkit-test").unwrap() }
