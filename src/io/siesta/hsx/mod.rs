/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Siesta's HSX file: Hamiltonian, overlap, and (since version 1) the geometry.
//!
//! Two dialects exist. Version 0 has no version tag, is always single
//! precision, and may end in an optional geometry trailer. Version 1 opens with
//! a version record and carries the geometry and Fermi level up front. Its
//! Hamiltonian may be stored relative to the Fermi level; see [`HsxHeader`].
//!
//! The layouts are documented in the decoders (`v0.rs`, `v1.rs`).

use crate::fortran::{Record, RecordReader};
use crate::units::{BOHR_IN_ANG, RY_IN_EV};
use crate::{Error, ReadSettings, Result, Sile};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slice_of_array::prelude::*;
use tbkit_operator::{Hamiltonian, Overlap, Spin};
use tbkit_sparse::PhysCsr;
use tbkit_structure::{Atom, Geometry, Lattice, Supercell};

mod v0;
mod v1;
mod write;

pub use self::write::{write_hsx, HsxWriteOptions, Precision};

/// Everything in an HSX file except for the matrices and the geometry.
///
/// Energies are in eV.
#[derive(Debug, Clone, PartialEq)]
pub struct HsxHeader {
    pub version: i32,
    /// Orbitals in the unit cell.
    pub no_u: usize,
    /// Orbitals in the supercell. (`no_u` times the number of images)
    pub no_s: usize,
    pub nspin: usize,
    /// Total stored nonzeros.
    pub nnz: usize,
    pub na_u: Option<usize>,
    pub nsc: Option<[usize; 3]>,
    pub double_precision: bool,
    /// The stored Hamiltonian is `H - Ef` on its spin-diagonal components.
    ///
    /// Readers never undo this; call `shift(fermi_level)` on the result
    /// to get the absolute Hamiltonian.
    pub ef_shifted: bool,
    pub fermi_level: Option<f64>,
    /// Total valence charge.
    pub qtot: f64,
    /// Electronic temperature (eV).
    pub temp: f64,
}

/// The geometry as stored in the file, in Angstrom.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AtomBlock {
    pub cell: [[f64; 3]; 3],
    pub xa: Vec<[f64; 3]>,
    pub z: Vec<i32>,
    /// `na + 1` cumulative orbital counts, starting at 0.
    pub lasto: Vec<usize>,
    pub nsc: [usize; 3],
}

/// A decoded file, before any geometry is attached.
#[derive(Debug, Clone)]
pub(crate) struct RawHsx {
    pub header: HsxHeader,
    pub atoms: Option<AtomBlock>,
    /// Shape `(no_u, no_s)`; `nspin` energies (eV) then the overlap at each nonzero.
    pub csr: PhysCsr,
}

/// One dialect of the format.
pub(crate) trait Decode {
    fn version(&self) -> i32;

    fn decode(&self, records: &mut RecordReader<'_>) -> Result<RawHsx>;
}

/// Pick the decoder by looking at the first record only.
///
/// A 4-byte record is a version tag. A 16-byte record is the count header
/// that version 0 starts with.
pub(crate) fn detect(records: &RecordReader<'_>) -> Result<Box<dyn Decode>> {
    match records.peek_len() {
        Some(4) => {
            let mut probe = records.clone();
            let version = probe.next_record("version")?.i32()?;
            match version {
                1 => Ok(Box::new(v1::V1)),
                v => Err(Error::UnsupportedVersion(v)),
            }
        },
        Some(16) => Ok(Box::new(v0::V0)),
        Some(n) => Err(Error::Parse(format!(
            "first record has {} bytes; expected a version tag (4) or counts (16)", n,
        ))),
        None => Err(Error::Parse("file is too short to be HSX".to_string())),
    }
}

impl AtomBlock {
    /// Read `[cell, xa]` in Bohr.
    pub(crate) fn read_positions(rec: &mut Record<'_>, na: usize) -> Result<([[f64; 3]; 3], Vec<[f64; 3]>)> {
        let cell = rec.f64s(9)?;
        let xa = rec.f64s(3 * na)?;
        let to_ang = |x: f64| x * BOHR_IN_ANG;
        let mut cell_ang = [[0.0; 3]; 3];
        for (dst, &src) in cell_ang.flat_mut().iter_mut().zip(&cell) {
            *dst = to_ang(src);
        }
        let xa = xa.into_iter().map(to_ang).collect::<Vec<_>>();
        Ok((cell_ang, xa.nest().to_vec()))
    }

    /// Read `[z, lasto(0..na)]`.
    pub(crate) fn read_species(rec: &mut Record<'_>, na: usize) -> Result<(Vec<i32>, Vec<usize>)> {
        let z = rec.i32s(na)?;
        let lasto = rec.i32s(na + 1)?;
        if lasto.iter().any(|&x| x < 0) {
            return Err(Error::Parse("negative orbital index in lasto".to_string()));
        }
        Ok((z, lasto.into_iter().map(|x| x as usize).collect()))
    }

    /// Check the block against the counts from the rest of the file.
    pub(crate) fn validate(&self, no_u: usize, no_s: usize) -> Result<()> {
        let na = self.z.len();
        if self.xa.len() != na || self.lasto.len() != na + 1 {
            return Err(Error::Parse(format!("atom block does not describe {} atoms", na)));
        }
        if self.lasto[0] != 0 || self.lasto.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Parse(format!("lasto is not a cumulative orbital count: {:?}", self.lasto)));
        }
        if self.lasto[na] != no_u {
            return Err(Error::Parse(format!(
                "atoms have {} orbitals in total, but the matrices have {}", self.lasto[na], no_u,
            )));
        }
        let supercell = Supercell::new(self.nsc).map_err(|e| Error::Parse(e.to_string()))?;
        if supercell.n_supercells().checked_mul(no_u) != Some(no_s) {
            return Err(Error::Parse(format!(
                "supercell {} with {} orbitals does not give {} supercell orbitals",
                supercell, no_u, no_s,
            )));
        }
        Ok(())
    }

    pub(crate) fn na(&self) -> usize
    { self.z.len() }

    pub(crate) fn orbital_counts(&self) -> Vec<usize>
    { self.lasto.windows(2).map(|w| w[1] - w[0]).collect() }

    pub(crate) fn to_geometry(&self) -> Result<Geometry> {
        let lattice = Lattice::with_supercell(self.cell, Supercell::new(self.nsc)?);
        let atoms = self.z.iter().zip(self.orbital_counts())
            .map(|(&z, orbitals)| Atom::new(z, orbitals))
            .collect();
        Ok(Geometry::new(lattice, self.xa.clone(), atoms)?)
    }
}

/// Spin components of `H`; anything else means the counts are garbage.
pub(crate) fn check_nspin(nspin: usize) -> Result<()> {
    Spin::from_nspin(nspin)
        .map(drop)
        .map_err(|e| Error::Parse(format!("bad counts record: {}", e)))
}

/// Read the sparse part shared by both versions:
///
/// ```text
/// [numh(no_u)]
/// [listh(numh(i))]              for each row i, 1-based columns
/// [H(numh(i))]                  for each spin, for each row (Ry)
/// [S(numh(i))]                  for each row
/// ```
pub(crate) fn decode_sparse(
    records: &mut RecordReader<'_>,
    (no_u, no_s): (usize, usize),
    nspin: usize,
    nnz: usize,
    double: bool,
) -> Result<PhysCsr>
{
    let mut rec = records.next_record("numh")?;
    let numh = rec.i32s(no_u)?;
    rec.finish()?;
    if let Some(&bad) = numh.iter().find(|&&n| n < 0) {
        return Err(Error::Parse(format!("negative numh ({}) in record 'numh'", bad)));
    }
    let numh = numh.into_iter().map(|n| n as usize).collect::<Vec<_>>();
    if numh.iter().sum::<usize>() != nnz {
        return Err(Error::Parse(format!("numh sums to {}, but the header says nnz = {}", numh.iter().sum::<usize>(), nnz)));
    }

    let mut ptr = vec![0];
    for &n in &numh {
        ptr.push(ptr[ptr.len() - 1] + n);
    }

    // every column takes at least 4 bytes of what is left
    let mut col = Vec::with_capacity(nnz.min(records.remaining() / 4));
    for &n in &numh {
        let mut rec = records.next_record("listh")?;
        for c in rec.i32s(n)? {
            if c < 1 || c as usize > no_s {
                return Err(Error::Parse(format!("column {} is out of range 1..={}", c, no_s)));
            }
            col.push(c as usize - 1);
        }
        rec.finish()?;
    }

    // col.len() == nnz is now backed by bytes actually present in the file
    let dim = nspin + 1;
    let mut data = vec![0.0; col.len() * dim];
    let mut read_values = |d: usize, what: &'static str, scale: f64| -> Result<()> {
        for (row, &n) in numh.iter().enumerate() {
            let mut rec = records.next_record(what)?;
            let values = rec.reals(n, double)?;
            rec.finish()?;
            for (k, x) in (ptr[row]..).zip(values) {
                data[k * dim + d] = x * scale;
            }
        }
        Ok(())
    };
    for s in 0..nspin {
        read_values(s, "H", RY_IN_EV)?;
    }
    read_values(nspin, "S", 1.0)?;

    PhysCsr::from_parts((no_u, no_s), dim, ptr, col, data)
        .map_err(|e| Error::Parse(format!("invalid sparsity pattern: {}", e)))
}

/// A Siesta HSX file.
#[derive(Debug, Clone)]
pub struct HsxSile {
    path: PathBuf,
    settings: ReadSettings,
}

impl HsxSile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self
    { HsxSile::with_settings(path, ReadSettings::default()) }

    pub fn with_settings<P: AsRef<Path>>(path: P, settings: ReadSettings) -> Self
    { HsxSile { path: path.as_ref().to_owned(), settings } }

    /// The format version, read from the first record only.
    pub fn version(&self) -> Result<i32> {
        let bytes = tbkit_fs_util::read_decompressed(&self.path)?;
        let records = RecordReader::new(&bytes);
        Ok(detect(&records).map_err(|e| self.in_file(e))?.version())
    }

    pub fn header(&self) -> Result<HsxHeader>
    { Ok(self.read_raw()?.header) }

    fn in_file(&self, e: Error) -> Error {
        match e {
            Error::Parse(msg) => Error::Parse(format!("{}: {}", self.path.display(), msg)),
            e => e,
        }
    }

    pub(crate) fn read_raw(&self) -> Result<RawHsx> {
        let bytes = tbkit_fs_util::read_decompressed(&self.path)?;
        let mut records = RecordReader::new(&bytes);
        let raw = {
            detect(&records)
                .and_then(|decoder| decoder.decode(&mut records))
                .map_err(|e| self.in_file(e))?
        };
        if !records.is_eof() {
            warn!("ignoring unrecognized data at the end of '{}'", self.path.display());
        }
        let header = &raw.header;
        debug!(
            "read '{}': HSX version {}, {} orbitals, {} images, nspin = {}, nnz = {}",
            self.path.display(), header.version, header.no_u,
            header.no_s / header.no_u.max(1), header.nspin, header.nnz,
        );
        Ok(raw)
    }

    /// The geometry to attach to the matrices of `raw`.
    fn reconcile(&self, raw: &RawHsx, geometry: Option<&Geometry>) -> Result<Geometry> {
        let HsxHeader { no_u, no_s, .. } = raw.header;
        match (geometry, &raw.atoms) {
            (None, None) => Err(Error::MissingGeometry(self.path.clone())),
            (None, Some(atoms)) => atoms.to_geometry(),
            (Some(geometry), Some(atoms)) => {
                if geometry.na() != atoms.na() {
                    return Err(Error::IncompatibleGeometry(format!(
                        "geometry has {} atoms, but '{}' has {}",
                        geometry.na(), self.path.display(), atoms.na(),
                    )));
                }

                let mut geometry = geometry.clone();
                let counts = atoms.orbital_counts();
                if geometry.orbital_counts() != counts {
                    if !self.settings.fix_orbitals {
                        return Err(Error::Shape(format!(
                            "orbitals per atom of the geometry ({} in total) do not match '{}' ({} in total)",
                            geometry.no(), self.path.display(), no_u,
                        )));
                    }
                    warn!(
                        "orbitals per atom of the geometry do not match '{}'; using the counts from the file",
                        self.path.display(),
                    );
                    geometry = geometry.with_orbital_counts(&counts)?;
                }
                if geometry.nsc() != atoms.nsc {
                    warn!(
                        "supercell of the geometry ({}) does not match '{}' ({:?}); using the one from the file",
                        geometry.supercell(), self.path.display(), atoms.nsc,
                    );
                    geometry = geometry.with_nsc(atoms.nsc)?;
                }
                Ok(geometry)
            },
            (Some(geometry), None) => {
                // no per-atom data to repair the geometry with
                if geometry.no() != no_u {
                    return Err(Error::Shape(format!(
                        "geometry has {} orbitals, but '{}' has {}", geometry.no(), self.path.display(), no_u,
                    )));
                }
                if geometry.no() * geometry.n_s() != no_s {
                    return Err(Error::Shape(format!(
                        "geometry has {} images, but '{}' has {}",
                        geometry.n_s(), self.path.display(), no_s / no_u.max(1),
                    )));
                }
                Ok(geometry.clone())
            },
        }
    }
}

impl Sile for HsxSile {
    fn path(&self) -> &Path
    { &self.path }

    fn format(&self) -> &'static str
    { "HSX" }

    fn read_geometry(&self) -> Result<Geometry> {
        let raw = self.read_raw()?;
        self.reconcile(&raw, None)
    }

    fn read_lattice(&self) -> Result<Lattice>
    { Ok(self.read_geometry()?.lattice().clone()) }

    fn read_hamiltonian(&self, geometry: Option<&Geometry>) -> Result<Hamiltonian> {
        let raw = self.read_raw()?;
        let geometry = Arc::new(self.reconcile(&raw, geometry)?);
        let spin = Spin::from_nspin(raw.header.nspin)?;
        Ok(Hamiltonian::from_csr(geometry, raw.csr, spin, false)?)
    }

    fn read_overlap(&self, geometry: Option<&Geometry>) -> Result<Overlap> {
        let raw = self.read_raw()?;
        let geometry = Arc::new(self.reconcile(&raw, geometry)?);
        let csr = raw.csr.select_dims(&[raw.header.nspin])?;
        Ok(Overlap::from_csr(geometry, csr)?)
    }

    fn read_fermi_level(&self) -> Result<Option<f64>> {
        let header = self.header()?;
        match header.fermi_level {
            Some(ef) => Ok(Some(ef)),
            None if self.settings.strict => Err(Error::MissingFermiLevel(self.path.clone())),
            None => {
                warn!(
                    "'{}' (HSX version {}) does not contain a Fermi level",
                    self.path.display(), header.version,
                );
                Ok(None)
            },
        }
    }
}
