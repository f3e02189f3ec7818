/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Fortran "unformatted sequential" records, as written by gfortran and ifort.
//!
//! Each record is `u32 len | payload | u32 len`, little endian.
//! Logicals are 4-byte integers where zero is false.

use crate::{Error, Result};

use std::io::{self, Write};

use byte_tools::{read_u32_le, read_u32v_le, read_u64v_le, write_u32_le, write_u32v_le, write_u64v_le};

const MARKER: usize = 4;

/// Reads records one by one from an in-memory file.
#[derive(Clone)]
pub(crate) struct RecordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self
    { RecordReader { bytes, pos: 0 } }

    pub fn is_eof(&self) -> bool
    { self.pos == self.bytes.len() }

    /// Bytes left in the file, markers included.
    pub fn remaining(&self) -> usize
    { self.bytes.len() - self.pos }

    /// Payload length of the next record, without consuming it.
    pub fn peek_len(&self) -> Option<usize> {
        let head = self.bytes.get(self.pos..self.pos + MARKER)?;
        Some(read_u32_le(head) as usize)
    }

    /// The next record; `what` names it in error messages.
    pub fn next_record(&mut self, what: &'static str) -> Result<Record<'a>> {
        let bytes = self.bytes;
        let truncated = || Error::Parse(format!("unexpected end of file in record '{}'", what));

        let len = self.peek_len().ok_or_else(truncated)?;
        let start = self.pos + MARKER;
        let end = start.checked_add(len).ok_or_else(truncated)?;
        let payload = bytes.get(start..end).ok_or_else(truncated)?;
        let tail = bytes.get(end..end + MARKER).ok_or_else(truncated)?;
        let tail_len = read_u32_le(tail) as usize;
        if tail_len != len {
            return Err(Error::Parse(format!(
                "record '{}' begins with length {} but ends with length {}", what, len, tail_len,
            )));
        }
        self.pos = end + MARKER;
        trace!("record '{}': {} bytes", what, len);
        Ok(Record { what, payload, pos: 0 })
    }
}

/// Sequential access to the values inside one record.
#[derive(Debug)]
pub(crate) struct Record<'a> {
    what: &'static str,
    payload: &'a [u8],
    pos: usize,
}

impl<'a> Record<'a> {
    #[cfg(test)]
    pub fn len(&self) -> usize
    { self.payload.len() }

    /// The next `n` values of `size` bytes each. Checked before anything
    /// is allocated, so a bogus count cannot outgrow the record.
    fn take(&mut self, n: usize, size: usize) -> Result<&'a [u8]> {
        let too_short = || Error::Parse(format!(
            "record '{}' is too short ({} bytes, {} more values of {} bytes requested at byte {})",
            self.what, self.payload.len(), n, size, self.pos,
        ));
        let end = n.checked_mul(size)
            .and_then(|n_bytes| self.pos.checked_add(n_bytes))
            .ok_or_else(too_short)?;
        let out = self.payload.get(self.pos..end).ok_or_else(too_short)?;
        self.pos = end;
        Ok(out)
    }

    pub fn i32s(&mut self, n: usize) -> Result<Vec<i32>> {
        let bytes = self.take(n, 4)?;
        let mut out = vec![0u32; n];
        read_u32v_le(&mut out, bytes);
        Ok(out.into_iter().map(|x| x as i32).collect())
    }

    pub fn i32(&mut self) -> Result<i32>
    { Ok(read_u32_le(self.take(1, 4)?) as i32) }

    /// A count or size; negative values are a parse error.
    pub fn usize(&mut self, name: &str) -> Result<usize> {
        let x = self.i32()?;
        if x < 0 {
            return Err(Error::Parse(format!("negative {} ({}) in record '{}'", name, x, self.what)));
        }
        Ok(x as usize)
    }

    pub fn logical(&mut self) -> Result<bool>
    { Ok(self.i32()? != 0) }

    pub fn f64s(&mut self, n: usize) -> Result<Vec<f64>> {
        let bytes = self.take(n, 8)?;
        let mut bits = vec![0u64; n];
        read_u64v_le(&mut bits, bytes);
        Ok(bits.into_iter().map(f64::from_bits).collect())
    }

    pub fn f32s(&mut self, n: usize) -> Result<Vec<f32>> {
        let bytes = self.take(n, 4)?;
        let mut bits = vec![0u32; n];
        read_u32v_le(&mut bits, bytes);
        Ok(bits.into_iter().map(f32::from_bits).collect())
    }

    /// Reals stored in either precision.
    pub fn reals(&mut self, n: usize, double: bool) -> Result<Vec<f64>> {
        match double {
            true => self.f64s(n),
            false => Ok(self.f32s(n)?.into_iter().map(f64::from).collect()),
        }
    }

    /// Assert that the whole payload was consumed.
    pub fn finish(self) -> Result<()> {
        match self.pos == self.payload.len() {
            true => Ok(()),
            false => Err(Error::Parse(format!(
                "record '{}' has {} unexpected trailing bytes",
                self.what, self.payload.len() - self.pos,
            ))),
        }
    }
}

/// Payload of one record under construction.
#[derive(Debug, Default)]
pub(crate) struct RecordBuf(Vec<u8>);

impl RecordBuf {
    pub fn new() -> Self
    { RecordBuf(vec![]) }

    pub fn i32s(mut self, xs: &[i32]) -> Self {
        let xs = xs.iter().map(|&x| x as u32).collect::<Vec<_>>();
        let start = self.grow(4 * xs.len());
        write_u32v_le(&mut self.0[start..], &xs);
        self
    }

    pub fn usizes(self, xs: &[usize]) -> Self
    { self.i32s(&xs.iter().map(|&x| x as i32).collect::<Vec<_>>()) }

    pub fn logical(self, x: bool) -> Self
    { self.i32s(&[x as i32]) }

    pub fn f64s(mut self, xs: &[f64]) -> Self {
        let bits = xs.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        let start = self.grow(8 * xs.len());
        write_u64v_le(&mut self.0[start..], &bits);
        self
    }

    pub fn f32s(mut self, xs: &[f32]) -> Self {
        let bits = xs.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        let start = self.grow(4 * xs.len());
        write_u32v_le(&mut self.0[start..], &bits);
        self
    }

    pub fn reals(self, xs: &[f64], double: bool) -> Self {
        match double {
            true => self.f64s(xs),
            false => self.f32s(&xs.iter().map(|&x| x as f32).collect::<Vec<_>>()),
        }
    }

    fn grow(&mut self, n_bytes: usize) -> usize {
        let start = self.0.len();
        self.0.resize(start + n_bytes, 0);
        start
    }

    /// Write the framed record.
    pub fn write_to(&self, mut w: impl Write) -> io::Result<()> {
        let mut marker = [0u8; MARKER];
        write_u32_le(&mut marker, self.0.len() as u32);
        w.write_all(&marker)?;
        w.write_all(&self.0)?;
        w.write_all(&marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(records: &[RecordBuf]) -> Vec<u8> {
        let mut out = vec![];
        for r in records {
            r.write_to(&mut out).unwrap();
        }
        out
    }

    #[test]
    fn mixed_records() {
        let bytes = framed(&[
            RecordBuf::new().i32s(&[1, -2, 3]).logical(true),
            RecordBuf::new().f64s(&[0.5, -1e300]).f32s(&[1.25]),
        ]);
        assert_eq!(bytes.len(), (4 + 16 + 4) + (4 + 20 + 4));

        let mut reader = RecordReader::new(&bytes);
        assert_eq!(reader.peek_len(), Some(16));
        let mut rec = reader.next_record("ints").unwrap();
        assert_eq!(rec.i32s(3).unwrap(), vec![1, -2, 3]);
        assert!(rec.logical().unwrap());
        rec.finish().unwrap();

        let mut rec = reader.next_record("reals").unwrap();
        assert_eq!(rec.reals(2, true).unwrap(), vec![0.5, -1e300]);
        assert_eq!(rec.reals(1, false).unwrap(), vec![1.25]);
        rec.finish().unwrap();
        assert!(reader.is_eof());
        assert_eq!(reader.peek_len(), None);
    }

    #[test]
    fn truncated() {
        let bytes = framed(&[RecordBuf::new().i32s(&[1, 2, 3, 4])]);
        let mut reader = RecordReader::new(&bytes[..bytes.len() - 2]);
        let err = reader.next_record("counts").err().unwrap();
        assert!(err.to_string().contains("counts"), "{}", err);
        assert!(err.is_parse_error());
    }

    #[test]
    fn mismatched_markers() {
        let mut bytes = framed(&[RecordBuf::new().i32s(&[7])]);
        let n = bytes.len();
        bytes[n - 4] = 9;
        assert!(RecordReader::new(&bytes).next_record("x").is_err());
    }

    #[test]
    fn short_and_long_records() {
        let bytes = framed(&[RecordBuf::new().i32s(&[1, 2])]);
        let mut rec = RecordReader::new(&bytes).next_record("pair").unwrap();
        assert_eq!(rec.len(), 8);
        assert!(rec.i32s(3).is_err());

        let mut rec = RecordReader::new(&bytes).next_record("pair").unwrap();
        rec.i32().unwrap();
        assert!(rec.finish().is_err());

        let bytes = framed(&[RecordBuf::new().i32s(&[-1])]);
        let mut rec = RecordReader::new(&bytes).next_record("count").unwrap();
        assert!(rec.usize("count").is_err());
    }

    #[test]
    fn huge_counts_fail_without_allocating() {
        let bytes = framed(&[RecordBuf::new().f64s(&[1.0, 2.0])]);
        let mut rec = RecordReader::new(&bytes).next_record("xa").unwrap();
        assert!(rec.f64s(i32::max_value() as usize).unwrap_err().is_parse_error());
        assert!(rec.i32s(usize::max_value()).unwrap_err().is_parse_error());
        assert!(rec.f32s(usize::max_value() / 2).unwrap_err().is_parse_error());
        // a failed read consumes nothing
        assert_eq!(rec.f64s(2).unwrap(), vec![1.0, 2.0]);
        rec.finish().unwrap();

        // a length marker pointing past the end of the file
        let mut bytes = framed(&[RecordBuf::new().i32s(&[1])]);
        bytes[..4].copy_from_slice(&u32::max_value().to_le_bytes());
        let mut reader = RecordReader::new(&bytes);
        assert_eq!(reader.remaining(), 12);
        assert!(reader.next_record("counts").unwrap_err().is_parse_error());
    }
}
