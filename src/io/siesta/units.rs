/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Unit conversion, with CODATA 2018 values.
//!
//! Siesta writes lengths in Bohr and energies in Rydberg; everything
//! returned by this crate is in Angstrom and eV.

/// One Bohr radius, in Angstrom.
pub const BOHR_IN_ANG: f64 = 0.529177210903;
/// One Rydberg, in eV.
pub const RY_IN_EV: f64 = 13.605693122994;

const EV_IN_J: f64 = 1.602176634e-19;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Energy,
    Mass,
    Time,
}

// (name, dimension, value in SI)
const TABLE: &[(&str, Dimension, f64)] = &[
    ("m", Dimension::Length, 1.0),
    ("cm", Dimension::Length, 1e-2),
    ("nm", Dimension::Length, 1e-9),
    ("pm", Dimension::Length, 1e-12),
    ("fm", Dimension::Length, 1e-15),
    ("Ang", Dimension::Length, 1e-10),
    ("Bohr", Dimension::Length, BOHR_IN_ANG * 1e-10),

    ("J", Dimension::Energy, 1.0),
    ("eV", Dimension::Energy, EV_IN_J),
    ("meV", Dimension::Energy, EV_IN_J * 1e-3),
    ("Ry", Dimension::Energy, RY_IN_EV * EV_IN_J),
    ("mRy", Dimension::Energy, RY_IN_EV * EV_IN_J * 1e-3),
    ("Ha", Dimension::Energy, 2.0 * RY_IN_EV * EV_IN_J),
    ("Hartree", Dimension::Energy, 2.0 * RY_IN_EV * EV_IN_J),
    ("K", Dimension::Energy, 1.380649e-23),

    ("kg", Dimension::Mass, 1.0),
    ("g", Dimension::Mass, 1e-3),
    ("amu", Dimension::Mass, 1.66053906660e-27),

    ("s", Dimension::Time, 1.0),
    ("ns", Dimension::Time, 1e-9),
    ("ps", Dimension::Time, 1e-12),
    ("fs", Dimension::Time, 1e-15),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown unit: {0:?}")]
    Unknown(String),

    #[error("cannot convert {from} ({from_dim:?}) to {to} ({to_dim:?})")]
    Incompatible {
        from: String,
        from_dim: Dimension,
        to: String,
        to_dim: Dimension,
    },
}

fn lookup(name: &str) -> Result<(Dimension, f64), UnitError> {
    TABLE.iter()
        .find(|&&(n, _, _)| n == name)
        .map(|&(_, dim, value)| (dim, value))
        .ok_or_else(|| UnitError::Unknown(name.to_string()))
}

/// The dimension of a unit name. Names are case-sensitive.
pub fn dimension(name: &str) -> Result<Dimension, UnitError>
{ lookup(name).map(|(dim, _)| dim) }

/// Factor that converts a quantity in `from` to `to`.
///
/// ```
/// # use tbkit_siesta_io::units::unit_convert;
/// let ang = 2.0 * unit_convert("Bohr", "Ang").unwrap();
/// assert!((ang - 1.058354421806).abs() < 1e-12);
/// ```
pub fn unit_convert(from: &str, to: &str) -> Result<f64, UnitError> {
    let (from_dim, from_si) = lookup(from)?;
    let (to_dim, to_si) = lookup(to)?;
    if from_dim != to_dim {
        return Err(UnitError::Incompatible {
            from: from.to_string(), from_dim,
            to: to.to_string(), to_dim,
        });
    }
    Ok(from_si / to_si)
}
