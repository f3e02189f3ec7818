/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::fortran::RecordBuf;
use crate::units::{BOHR_IN_ANG, RY_IN_EV};
use crate::{Error, Result};

use std::path::Path;

use slice_of_array::prelude::*;
use tbkit_fs_util::CompressedWriter;
use tbkit_operator::Hamiltonian;
use tbkit_structure::Geometry;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

/// How to write an HSX file.
#[derive(Debug, Clone, PartialEq)]
pub struct HsxWriteOptions {
    /// 0 or 1.
    pub version: i32,
    /// Version 0 is always single precision.
    pub precision: Precision,
    /// Fermi level in eV. Only version 1 stores one.
    pub fermi_level: Option<f64>,
    /// Store `H - Ef` on the spin-diagonal components. Version 1 only.
    pub shifted: bool,
    /// Append the geometry to a version 0 file. (version 1 always has it)
    pub geometry_trailer: bool,
    pub qtot: f64,
    /// Electronic temperature in eV.
    pub temp: f64,
}

impl Default for HsxWriteOptions {
    fn default() -> Self {
        HsxWriteOptions {
            version: 1,
            precision: Precision::Double,
            fermi_level: None,
            shifted: false,
            geometry_trailer: true,
            qtot: 0.0,
            temp: 0.0,
        }
    }
}

/// Write a non-orthogonal Hamiltonian (with its overlap) to an HSX file.
///
/// The file is gzipped if `path` ends in `.gz`.
pub fn write_hsx<P: AsRef<Path>>(path: P, ham: &Hamiltonian, options: &HsxWriteOptions) -> Result<()> {
    let path = path.as_ref();
    let s_idx = ham.s_idx().ok_or_else(|| {
        Error::Shape("an HSX file always stores the overlap; cannot write an orthogonal Hamiltonian".to_string())
    })?;

    let energy_shift = match (options.version, options.shifted, options.fermi_level) {
        (0, true, _) => return Err(Error::Unsupported { format: "HSX version 0", operation: "writing a shifted Hamiltonian" }),
        (0, false, _) => 0.0,
        (1, true, Some(ef)) => ef,
        (1, true, None) => return Err(Error::Shape("a shifted Hamiltonian needs a Fermi level".to_string())),
        (1, false, _) => 0.0,
        (v, _, _) => return Err(Error::UnsupportedVersion(v)),
    };
    let double = options.version == 1 && options.precision == Precision::Double;

    let records = Records::new(ham, s_idx, energy_shift)?;
    let mut out = Output { path, w: tbkit_fs_util::create_compressed(path)? };
    match options.version {
        0 => write_v0(&mut out, &records, ham.geometry(), options)?,
        _ => write_v1(&mut out, &records, ham.geometry(), options, double)?,
    }
    debug!(
        "wrote '{}': HSX version {}, {} orbitals, nnz = {}",
        path.display(), options.version, ham.no(), ham.nnz(),
    );
    Ok(out.w.finish()?)
}

struct Output<'a> {
    path: &'a Path,
    w: CompressedWriter,
}

impl Output<'_> {
    fn put(&mut self, record: RecordBuf) -> Result<()> {
        record.write_to(&mut self.w).map_err(|source| {
            Error::Io(tbkit_fs_util::Error { action: "while writing", path: self.path.to_owned(), source })
        })
    }
}

/// The sparse part of the file, laid out row by row.
struct Records {
    nspin: usize,
    numh: Vec<usize>,
    listh: Vec<Vec<usize>>,
    /// `[spin][row][k]` in Ry.
    h: Vec<Vec<Vec<f64>>>,
    s: Vec<Vec<f64>>,
}

impl Records {
    fn new(ham: &Hamiltonian, s_idx: usize, energy_shift: f64) -> Result<Self> {
        let csr = ham.csr();
        let nspin = ham.spin().nspin();
        let diagonal = ham.spin().diagonal();
        let mut out = Records { nspin, numh: vec![], listh: vec![], h: vec![vec![]; nspin], s: vec![] };

        for row in 0..csr.nrows() {
            let view = csr.row(row)?;
            out.numh.push(view.len());
            out.listh.push(view.cols().to_vec());
            out.s.push(view.iter().map(|(_, values)| values[s_idx]).collect());
            for (spin, h) in out.h.iter_mut().enumerate() {
                let shift = if diagonal.contains(&spin) { energy_shift } else { 0.0 };
                h.push(view.iter().map(|(_, values)| (values[spin] - shift) / RY_IN_EV).collect());
            }
        }
        Ok(out)
    }

    fn nnz(&self) -> usize
    { self.numh.iter().sum() }

    fn write(&self, out: &mut Output<'_>, double: bool) -> Result<()> {
        out.put(RecordBuf::new().usizes(&self.numh))?;
        for cols in &self.listh {
            let one_based = cols.iter().map(|&c| c + 1).collect::<Vec<_>>();
            out.put(RecordBuf::new().usizes(&one_based))?;
        }
        for spin in 0..self.nspin {
            for h_row in &self.h[spin] {
                out.put(RecordBuf::new().reals(h_row, double))?;
            }
        }
        for s_row in &self.s {
            out.put(RecordBuf::new().reals(s_row, double))?;
        }
        Ok(())
    }
}

fn positions(geometry: &Geometry) -> RecordBuf {
    let to_bohr = |&x: &f64| x / BOHR_IN_ANG;
    let cell = geometry.lattice().matrix().flat().iter().map(to_bohr).collect::<Vec<_>>();
    let xa = geometry.xyz().flat().iter().map(to_bohr).collect::<Vec<_>>();
    RecordBuf::new().f64s(&cell).f64s(&xa)
}

fn species(geometry: &Geometry) -> RecordBuf
{ RecordBuf::new().i32s(&geometry.species()).usizes(geometry.firsto()) }

fn write_v0(out: &mut Output<'_>, records: &Records, geometry: &Geometry, options: &HsxWriteOptions) -> Result<()> {
    let no_u = geometry.no();
    let no_s = no_u * geometry.n_s();
    let gamma = geometry.n_s() == 1;

    out.put(RecordBuf::new().usizes(&[no_u, no_s, records.nspin, records.nnz()]))?;
    out.put(RecordBuf::new().logical(gamma))?;
    if !gamma {
        let indxuo = (0..no_s).map(|j| j % no_u + 1).collect::<Vec<_>>();
        out.put(RecordBuf::new().usizes(&indxuo))?;
    }
    records.write(out, false)?;
    out.put(RecordBuf::new().f64s(&[options.qtot, options.temp / RY_IN_EV]))?;

    if options.geometry_trailer {
        let nsc = geometry.nsc();
        out.put(RecordBuf::new().usizes(&[geometry.na(), nsc[0], nsc[1], nsc[2]]))?;
        out.put(positions(geometry))?;
        out.put(species(geometry))?;
    }
    Ok(())
}

fn write_v1(out: &mut Output<'_>, records: &Records, geometry: &Geometry, options: &HsxWriteOptions, double: bool) -> Result<()> {
    let no_u = geometry.no();
    let no_s = no_u * geometry.n_s();
    let nsc = geometry.nsc();
    let fermi_level = options.fermi_level.unwrap_or_else(|| {
        warn!("writing HSX version 1 without a Fermi level; storing 0 eV");
        0.0
    });

    out.put(RecordBuf::new().i32s(&[1]))?;
    out.put(RecordBuf::new().logical(double).logical(options.shifted))?;
    out.put(RecordBuf::new().usizes(&[geometry.na(), no_u, no_s, records.nspin, records.nnz(), nsc[0], nsc[1], nsc[2]]))?;
    out.put(positions(geometry))?;
    out.put(species(geometry))?;
    out.put(RecordBuf::new().f64s(&[fermi_level / RY_IN_EV, options.qtot, options.temp / RY_IN_EV]))?;
    records.write(out, double)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HsxSile, Sile};

    use std::sync::Arc;

    use tbkit_operator::{Spin, Tolerances};
    use tbkit_structure::{Atom, Lattice, Supercell};

    fn chain() -> Hamiltonian {
        let lattice = Lattice::with_supercell(
            [[2.5, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]],
            Supercell::new([3, 1, 1]).unwrap(),
        );
        let geometry = Geometry::new(
            lattice,
            vec![[0.0, 0.0, 0.0], [1.25, 0.0, 0.0]],
            vec![Atom::new(6, 2), Atom::new(1, 1)],
        ).unwrap();
        let mut ham = Hamiltonian::new(Arc::new(geometry), Spin::Unpolarized, false).unwrap();
        for io in 0..3 {
            ham.set(io, io, [0, 0, 0], &[-1.5 + io as f64, 1.0]).unwrap();
        }
        ham.set(0, 2, [0, 0, 0], &[-2.7, 0.2]).unwrap();
        ham.set(2, 0, [0, 0, 0], &[-2.7, 0.2]).unwrap();
        ham.set(2, 0, [1, 0, 0], &[-0.3, 0.05]).unwrap();
        ham.set(0, 2, [-1, 0, 0], &[-0.3, 0.05]).unwrap();
        ham.finalize();
        ham
    }

    fn tol() -> Tolerances
    { Tolerances { abs: 1e-12, rel: 1e-12 } }

    #[test]
    fn version_1_double() {
        let dir = tempdir::TempDir::new("tbkit-hsx").unwrap();
        let path = dir.path().join("chain.HSX");
        let ham = chain();
        let options = HsxWriteOptions { fermi_level: Some(-3.0), qtot: 5.0, temp: 0.025, ..Default::default() };
        write_hsx(&path, &ham, &options).unwrap();

        let sile = HsxSile::new(&path);
        assert_eq!(sile.version().unwrap(), 1);
        let header = sile.header().unwrap();
        assert_eq!((header.no_u, header.no_s, header.nnz), (3, 9, 7));
        assert_close!(header.fermi_level.unwrap(), -3.0);
        assert_close!(header.temp, 0.025);
        assert_eq!(header.qtot, 5.0);

        let read = sile.read_hamiltonian(None).unwrap();
        assert!(read.close_to(&ham, tol()));
        assert!(read.geometry().close_to(ham.geometry(), tol()));
    }

    #[test]
    fn shifted_by_fermi_level() {
        let dir = tempdir::TempDir::new("tbkit-hsx").unwrap();
        let path = dir.path().join("chain.HSX");
        let ham = chain();
        let options = HsxWriteOptions { fermi_level: Some(-3.0), shifted: true, ..Default::default() };
        write_hsx(&path, &ham, &options).unwrap();

        let sile = HsxSile::new(&path);
        assert!(sile.header().unwrap().ef_shifted);
        let mut read = sile.read_hamiltonian(None).unwrap();
        assert_close!(read.get(0, 0, [0, 0, 0]).unwrap().unwrap()[0], 1.5);
        read.shift(-3.0).unwrap();
        assert!(read.close_to(&ham, tol()));
    }

    #[test]
    fn version_0_single() {
        let dir = tempdir::TempDir::new("tbkit-hsx").unwrap();
        let ham = chain();
        let loose = Tolerances { abs: 1e-6, rel: 1e-6 };

        let path = dir.path().join("with-trailer.HSX");
        let options = HsxWriteOptions { version: 0, ..Default::default() };
        write_hsx(&path, &ham, &options).unwrap();
        let sile = HsxSile::new(&path);
        assert_eq!(sile.version().unwrap(), 0);
        assert!(!sile.header().unwrap().double_precision);
        assert!(sile.read_hamiltonian(None).unwrap().close_to(&ham, loose));

        let path = dir.path().join("bare.HSX");
        let options = HsxWriteOptions { version: 0, geometry_trailer: false, ..Default::default() };
        write_hsx(&path, &ham, &options).unwrap();
        let sile = HsxSile::new(&path);
        assert!(matches!(sile.read_hamiltonian(None), Err(Error::MissingGeometry(_))));
        let read = sile.read_hamiltonian(Some(ham.geometry())).unwrap();
        assert!(read.close_to(&ham, loose));
    }

    #[test]
    fn rejected_options() {
        let dir = tempdir::TempDir::new("tbkit-hsx").unwrap();
        let path = dir.path().join("nope.HSX");
        let ham = chain();

        let options = HsxWriteOptions { version: 0, shifted: true, fermi_level: Some(1.0), ..Default::default() };
        assert!(matches!(write_hsx(&path, &ham, &options), Err(Error::Unsupported { .. })));

        let options = HsxWriteOptions { shifted: true, ..Default::default() };
        assert!(write_hsx(&path, &ham, &options).unwrap_err().is_shape_error());

        let options = HsxWriteOptions { version: 2, ..Default::default() };
        assert!(matches!(write_hsx(&path, &ham, &options), Err(Error::UnsupportedVersion(2))));

        let orthogonal = Hamiltonian::new(ham.geometry().clone(), Spin::Unpolarized, true).unwrap();
        let options = HsxWriteOptions::default();
        assert!(write_hsx(&path, &orthogonal, &options).unwrap_err().is_shape_error());
    }
}
