/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Error, Result};

use ndarray::{Array4, ArrayView4};

/// Number of displacement directions per displaced atom: -x, +x, -y, +y, -z, +z.
pub const DIRECTIONS: usize = 6;

/// Force constants from finite displacements, in eV/Ang^2.
///
/// Axes are `(displaced atom, direction, atom, cartesian)`, where `direction`
/// runs over `-x, +x, -y, +y, -z, +z`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConstants {
    data: Array4<f64>,
}

impl ForceConstants {
    /// Wrap an array, which must have shape `(_, 6, _, 3)`.
    pub fn from_array(data: Array4<f64>) -> Result<Self> {
        let shape = data.shape();
        if shape[1] != DIRECTIONS || shape[3] != 3 {
            return Err(Error::Shape(format!("force constants must have shape (*, 6, na, 3), got {:?}", shape)));
        }
        Ok(ForceConstants { data })
    }

    /// Reshape a flat list of values (in row-major order) to `(*, 6, na, 3)`.
    ///
    /// Without `na`, the data is assumed to hold a single displaced atom,
    /// so `na = len / 18`.
    pub fn from_flat(values: Vec<f64>, na: Option<usize>) -> Result<Self> {
        let block = DIRECTIONS * 3;
        let total = values.len();
        let na = match na {
            Some(na) => na,
            None => {
                if total == 0 || total % block != 0 {
                    return Err(Error::Shape(format!(
                        "cannot infer the number of atoms from {} force constant values", total,
                    )));
                }
                let na = total / block;
                debug!("inferred {} atoms from {} force constant values", na, total);
                na
            },
        };
        if na == 0 || total % (block * na) != 0 {
            return Err(Error::Shape(format!(
                "{} force constant values do not fit shape (*, 6, {}, 3)", total, na,
            )));
        }
        let shape = (total / (block * na), DIRECTIONS, na, 3);
        let data = Array4::from_shape_vec(shape, values)
            .map_err(|e| Error::Shape(e.to_string()))?;
        Ok(ForceConstants { data })
    }

    /// Number of displaced atoms.
    pub fn n_displacements(&self) -> usize
    { self.data.shape()[0] }

    /// Number of atoms that forces act on.
    pub fn na(&self) -> usize
    { self.data.shape()[2] }

    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn view(&self) -> ArrayView4<'_, f64>
    { self.data.view() }

    pub fn into_array(self) -> Array4<f64>
    { self.data }

    /// Forces of the displaced configurations (eV/Ang), relative to the
    /// undisplaced one, for a displacement of `displacement` Ang.
    pub fn forces(&self, displacement: f64) -> Array4<f64>
    { self.data.mapv(|fc| -fc * displacement) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_atoms() {
        let fc = ForceConstants::from_flat((0..36).map(|x| x as f64).collect(), None).unwrap();
        assert_eq!(fc.shape(), [1, 6, 2, 3]);
        // row-major: the last axis varies fastest
        assert_eq!(fc.view()[[0, 1, 0, 2]], 8.0);
    }

    #[test]
    fn explicit_atoms() {
        let fc = ForceConstants::from_flat(vec![0.0; 72], Some(2)).unwrap();
        assert_eq!(fc.shape(), [2, 6, 2, 3]);
        assert_eq!(fc.n_displacements(), 2);
        assert_eq!(fc.na(), 2);
    }

    #[test]
    fn bad_shapes() {
        assert!(matches!(ForceConstants::from_flat(vec![0.0; 20], None), Err(Error::Shape(_))));
        assert!(matches!(ForceConstants::from_flat(vec![0.0; 36], Some(4)), Err(Error::Shape(_))));
        assert!(matches!(ForceConstants::from_flat(vec![], None), Err(Error::Shape(_))));
        assert!(matches!(ForceConstants::from_flat(vec![0.0; 18], Some(0)), Err(Error::Shape(_))));
        assert!(ForceConstants::from_array(Array4::zeros((1, 5, 2, 3))).is_err());
    }

    #[test]
    fn forces() {
        let fc = ForceConstants::from_flat(vec![2.0; 18], None).unwrap();
        let f = fc.forces(0.5);
        assert!(f.iter().all(|&x| x == -1.0));
    }
}
