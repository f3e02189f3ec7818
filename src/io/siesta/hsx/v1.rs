/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! HSX version 1.
//!
//! ```text
//! [version = 1]                                i32
//! [is_dp, ef_shifted]                          logical
//! [na_u, no_u, no_s, nspin, nnz, nsc(3)]       i32
//! [cell(3,3), xa(3,na_u)]                      f64, Bohr
//! [z(na_u), lasto(0..na_u)]                    i32
//! [Ef, qtot, temp]                             f64, Ry
//! (sparse part, see decode_sparse)             f64 if is_dp else f32, Ry
//! ```

use super::{check_nspin, decode_sparse, AtomBlock, Decode, HsxHeader, RawHsx};
use crate::fortran::RecordReader;
use crate::units::RY_IN_EV;
use crate::{Error, Result};

pub(crate) struct V1;

impl Decode for V1 {
    fn version(&self) -> i32
    { 1 }

    fn decode(&self, records: &mut RecordReader<'_>) -> Result<RawHsx> {
        let mut rec = records.next_record("version")?;
        let version = rec.i32()?;
        rec.finish()?;
        if version != 1 {
            return Err(Error::UnsupportedVersion(version));
        }

        let mut rec = records.next_record("is_dp/ef_shifted")?;
        let double_precision = rec.logical()?;
        let ef_shifted = rec.logical()?;
        rec.finish()?;

        let mut rec = records.next_record("counts")?;
        let na = rec.usize("na_u")?;
        let no_u = rec.usize("no_u")?;
        let no_s = rec.usize("no_s")?;
        let nspin = rec.usize("nspin")?;
        let nnz = rec.usize("nnz")?;
        let mut nsc = [0; 3];
        for n in &mut nsc {
            *n = rec.usize("nsc")?;
        }
        rec.finish()?;
        check_nspin(nspin)?;

        let mut rec = records.next_record("cell/xa")?;
        let (cell, xa) = AtomBlock::read_positions(&mut rec, na)?;
        rec.finish()?;

        let mut rec = records.next_record("z/lasto")?;
        let (z, lasto) = AtomBlock::read_species(&mut rec, na)?;
        rec.finish()?;

        let atoms = AtomBlock { cell, xa, z, lasto, nsc };
        atoms.validate(no_u, no_s)?;

        let mut rec = records.next_record("Ef/qtot/temp")?;
        let energies = rec.f64s(3)?;
        rec.finish()?;

        let csr = decode_sparse(records, (no_u, no_s), nspin, nnz, double_precision)?;

        let header = HsxHeader {
            version: 1,
            no_u, no_s, nspin, nnz,
            na_u: Some(na),
            nsc: Some(nsc),
            double_precision,
            ef_shifted,
            fermi_level: Some(energies[0] * RY_IN_EV),
            qtot: energies[1],
            temp: energies[2] * RY_IN_EV,
        };
        Ok(RawHsx { header, atoms: Some(atoms), csr })
    }
}
