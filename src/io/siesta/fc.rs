/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Siesta's `FC` file: force constants from finite displacements, as text.
//!
//! The first line is free-form, except that its last two tokens may give
//! the number of atoms and the displacement (Ang). The remaining lines hold
//! the force constants in eV/Ang^2, read until a blank line or the end of
//! the file.

use crate::units::BOHR_IN_ANG;
use crate::{Error, ReadSettings, Result, Sile};

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use ndarray::Array4;
use tbkit_operator::ForceConstants;

/// Siesta's default `MD.FCDispl`, in Bohr.
pub const DEFAULT_DISPLACEMENT_BOHR: f64 = 0.04;

/// Forces on every atom for each displaced configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Forces {
    /// eV/Ang, with shape `(*, 6, na, 3)`.
    pub forces: Array4<f64>,
    /// Displacement in Ang.
    pub displacement: f64,
    /// Neither the caller nor the file gave a displacement, so Siesta's
    /// default was used.
    pub displacement_assumed: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct FcData {
    /// Atom count from the header, if it had one.
    na: Option<usize>,
    /// Displacement (Ang) from the header, if it had one.
    displacement: Option<f64>,
    values: Vec<f64>,
}

/// A Siesta `FC` or `FCC` file.
#[derive(Debug, Clone)]
pub struct FcSile {
    path: PathBuf,
    settings: ReadSettings,
}

impl FcSile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self
    { FcSile::with_settings(path, ReadSettings::default()) }

    pub fn with_settings<P: AsRef<Path>>(path: P, settings: ReadSettings) -> Self
    { FcSile { path: path.as_ref().to_owned(), settings } }

    fn read_data(&self) -> Result<FcData> {
        let file = tbkit_fs_util::open_decompressed(&self.path)?;
        let data = parse(file, &self.path)?;
        debug!(
            "read '{}': {} values (header: na = {:?}, displacement = {:?})",
            self.path.display(), data.values.len(), data.na, data.displacement,
        );
        Ok(data)
    }
}

fn parse(r: impl BufRead, path: &Path) -> Result<FcData> {
    let mut lines = r.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(Error::Parse(format!("{}: empty file", path.display()))),
    };

    // the header is commentary; unusable tokens are not an error
    let tokens = header.split_whitespace().collect::<Vec<_>>();
    let displacement = tokens.last().and_then(|t| parse_real(t));
    let na = match tokens.len() {
        n if n >= 2 => tokens[n - 2].parse().ok(),
        _ => None,
    };

    let mut values = vec![];
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        for token in line.split_whitespace() {
            let x = parse_real(token).ok_or_else(|| {
                Error::Parse(format!("{}:{}: expected a number, found {:?}", path.display(), i + 2, token))
            })?;
            values.push(x);
        }
    }
    Ok(FcData { na, displacement, values })
}

// accepts Fortran's 'D' exponents
fn parse_real(token: &str) -> Option<f64> {
    match token.parse() {
        Ok(x) => Some(x),
        Err(_) => token.replace(|c| c == 'd' || c == 'D', "e").parse().ok(),
    }
}

impl Sile for FcSile {
    fn path(&self) -> &Path
    { &self.path }

    fn format(&self) -> &'static str
    { "FC" }

    /// An explicit `na` wins over the header; without either, the file is
    /// assumed to hold a single displaced atom.
    fn read_force_constant(&self, na: Option<usize>) -> Result<ForceConstants> {
        let data = self.read_data()?;
        Ok(ForceConstants::from_flat(data.values, na.or(data.na))?)
    }

    fn read_force(&self, displacement: Option<f64>, na: Option<usize>) -> Result<Forces> {
        let data = self.read_data()?;
        let (displacement, displacement_assumed) = match displacement.or(data.displacement) {
            Some(d) => (d, false),
            None if self.settings.strict => {
                return Err(Error::Parse(format!("{}: the header does not give the displacement", self.path.display())));
            },
            None => {
                let d = DEFAULT_DISPLACEMENT_BOHR * BOHR_IN_ANG;
                warn!(
                    "'{}' does not give the displacement; assuming {} Bohr ({:.6} Ang)",
                    self.path.display(), DEFAULT_DISPLACEMENT_BOHR, d,
                );
                (d, true)
            },
        };
        let fc = ForceConstants::from_flat(data.values, na.or(data.na))?;
        Ok(Forces { forces: fc.forces(displacement), displacement, displacement_assumed })
    }
}

/// Write force constants in the layout read by [`FcSile`], three values per line.
pub fn write_force_constant<P: AsRef<Path>>(path: P, fc: &ForceConstants, displacement: f64) -> Result<()> {
    let path = path.as_ref();
    let mut w = tbkit_fs_util::create_compressed(path)?;
    let wrap = |source| Error::Io(tbkit_fs_util::Error { action: "while writing", path: path.to_owned(), source });

    writeln!(w, "Force constants matrix {} {}", fc.na(), displacement).map_err(wrap)?;
    let values = fc.view().iter().cloned().collect::<Vec<_>>();
    for line in values.chunks(3) {
        for x in line {
            write!(w, " {:>17.10e}", x).map_err(wrap)?;
        }
        writeln!(w).map_err(wrap)?;
    }
    Ok(w.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &str) -> Result<FcData>
    { parse(s.as_bytes(), "test.FC".as_ref()) }

    #[test]
    fn header_tokens() {
        let data = parse_str("Force constants matrix 2 0.02\n1 2 3\n").unwrap();
        assert_eq!(data.na, Some(2));
        assert_eq!(data.displacement, Some(0.02));
        assert_eq!(data.values, vec![1.0, 2.0, 3.0]);

        let data = parse_str("Force constants matrix\n1 2 3\n").unwrap();
        assert_eq!((data.na, data.displacement), (None, None));

        let data = parse_str("fc 3 lots\n").unwrap();
        assert_eq!((data.na, data.displacement), (Some(3), None));

        let data = parse_str("0.02\n").unwrap();
        assert_eq!((data.na, data.displacement), (None, Some(0.02)));

        let data = parse_str("\n").unwrap();
        assert_eq!((data.na, data.displacement), (None, None));
        assert!(data.values.is_empty());
    }

    #[test]
    fn body_ends_at_blank_line() {
        let data = parse_str("hdr\n1.5 -2.0D-01\n 3.0e1\n\n99 not numbers\n").unwrap();
        assert_eq!(data.values, vec![1.5, -0.2, 30.0]);
    }

    #[test]
    fn bad_token_has_line_number() {
        let err = parse_str("hdr\n1 2 3\n4 five 6\n").unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("test.FC:3"), "{}", err);
    }

    #[test]
    fn empty_file() {
        assert!(parse_str("").unwrap_err().is_parse_error());
    }

    #[test]
    fn fortran_exponents() {
        assert_eq!(parse_real("1.0d2"), Some(100.0));
        assert_eq!(parse_real("-2.5D-1"), Some(-0.25));
        assert_eq!(parse_real("nope"), None);
    }
}
