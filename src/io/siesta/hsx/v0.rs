/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The original HSX layout. Single precision, no version tag, no Fermi level.
//!
//! ```text
//! [no_u, no_s, nspin, nnz]          i32
//! [gamma]                           logical
//! [indxuo(no_s)]                    i32, only if not gamma
//! (sparse part, see decode_sparse)  f32, Ry
//! [qtot, temp]                      f64, temp in Ry
//! -- optional trailer --
//! [na_u, nsc(3)]                    i32
//! [cell(3,3), xa(3,na_u)]           f64, Bohr
//! [z(na_u), lasto(0..na_u)]         i32
//! ```

use super::{check_nspin, decode_sparse, AtomBlock, Decode, HsxHeader, RawHsx};
use crate::fortran::RecordReader;
use crate::units::RY_IN_EV;
use crate::{Error, Result};

pub(crate) struct V0;

impl Decode for V0 {
    fn version(&self) -> i32
    { 0 }

    fn decode(&self, records: &mut RecordReader<'_>) -> Result<RawHsx> {
        let mut rec = records.next_record("counts")?;
        let no_u = rec.usize("no_u")?;
        let no_s = rec.usize("no_s")?;
        let nspin = rec.usize("nspin")?;
        let nnz = rec.usize("nnz")?;
        rec.finish()?;
        check_nspin(nspin)?;

        let mut rec = records.next_record("gamma")?;
        let gamma = rec.logical()?;
        rec.finish()?;

        if gamma {
            if no_s != no_u {
                return Err(Error::Parse(format!("gamma-only file with no_u = {} but no_s = {}", no_u, no_s)));
            }
        } else {
            // supercell orbital -> unit cell orbital; implied by the column layout
            let mut rec = records.next_record("indxuo")?;
            let indxuo = rec.i32s(no_s)?;
            rec.finish()?;
            if let Some(&bad) = indxuo.iter().find(|&&i| i < 1 || i as usize > no_u) {
                return Err(Error::Parse(format!("indxuo entry {} is out of range 1..={}", bad, no_u)));
            }
        }

        let csr = decode_sparse(records, (no_u, no_s), nspin, nnz, false)?;

        let mut rec = records.next_record("qtot/temp")?;
        let qtot_temp = rec.f64s(2)?;
        rec.finish()?;

        let atoms = match records.is_eof() {
            true => None,
            false => Some(read_trailer(records, no_u, no_s)?),
        };

        let header = HsxHeader {
            version: 0,
            no_u, no_s, nspin, nnz,
            na_u: atoms.as_ref().map(AtomBlock::na),
            nsc: atoms.as_ref().map(|a| a.nsc),
            double_precision: false,
            ef_shifted: false,
            fermi_level: None,
            qtot: qtot_temp[0],
            temp: qtot_temp[1] * RY_IN_EV,
        };
        Ok(RawHsx { header, atoms, csr })
    }
}

fn read_trailer(records: &mut RecordReader<'_>, no_u: usize, no_s: usize) -> Result<AtomBlock> {
    let mut rec = records.next_record("na_u/nsc")?;
    let na = rec.usize("na_u")?;
    let mut nsc = [0; 3];
    for n in &mut nsc {
        *n = rec.usize("nsc")?;
    }
    rec.finish()?;

    let mut rec = records.next_record("cell/xa")?;
    let (cell, xa) = AtomBlock::read_positions(&mut rec, na)?;
    rec.finish()?;

    let mut rec = records.next_record("z/lasto")?;
    let (z, lasto) = AtomBlock::read_species(&mut rec, na)?;
    rec.finish()?;

    let atoms = AtomBlock { cell, xa, z, lasto, nsc };
    atoms.validate(no_u, no_s)?;
    Ok(atoms)
}
