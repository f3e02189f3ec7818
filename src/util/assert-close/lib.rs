/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Approximate equality of floats.
//!
//! Used by tests through [`assert_close!`], and by the operator types
//! whenever two matrices are compared "numerically" rather than bitwise.

use std::fmt;

/// Relative tolerance used when none is given.
pub const DEFAULT_REL_TOL: f64 = 1e-9;

/// Asserts that two values are close.
///
/// ```
/// # #[macro_use] extern crate tbkit_assert_close;
/// # fn main() {
/// assert_close!(1.0, 1.0 + 1e-12);
/// assert_close!(abs=1e-6, 0.0, 1e-7);
/// assert_close!(rel=1e-3, abs=0.0, vec![1.0, 2.0], vec![1.0001, 2.0]);
/// # }
/// ```
///
/// Unspecified tolerances take their [`Tolerances::default`] values.
#[macro_export]
macro_rules! assert_close {
    (abs=$abs:expr, rel=$rel:expr, $a:expr, $b:expr $(,)?) => {
        $crate::assert_close!(rel=$rel, abs=$abs, $a, $b)
    };
    (rel=$rel:expr, abs=$abs:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__assert_close(&$a, &$b, $crate::Tolerances { abs: $abs, rel: $rel })
    };
    (abs=$abs:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__assert_close(&$a, &$b, $crate::Tolerances { abs: $abs, ..Default::default() })
    };
    (rel=$rel:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__assert_close(&$a, &$b, $crate::Tolerances { rel: $rel, ..Default::default() })
    };
    ($a:expr, $b:expr $(,)?) => {
        $crate::__assert_close(&$a, &$b, $crate::Tolerances::default())
    };
}

#[doc(hidden)]
#[track_caller]
pub fn __assert_close<A, B>(a: &A, b: &B, tol: Tolerances)
where
    A: CheckClose<B> + fmt::Debug + ?Sized,
    B: fmt::Debug + ?Sized,
{
    if let Err(e) = a.check_close(b, tol) {
        panic!("not nearly equal!\n left: {:?}\nright: {:?}\n{}", a, b, e);
    }
}

/// Absolute and relative tolerance; a pair of values passes if it passes either.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self
    { Tolerances { abs: 0.0, rel: DEFAULT_REL_TOL } }
}

impl Tolerances {
    pub fn abs(abs: f64) -> Self
    { Tolerances { abs, rel: 0.0 } }

    pub fn rel(rel: f64) -> Self
    { Tolerances { abs: 0.0, rel } }

    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool
    { is_close(a, b, *self) }
}

/// Closeness test modeled after Python's `math.isclose`.
#[inline]
pub fn is_close(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    debug_assert!(abs >= 0.0 && rel >= 0.0);

    // equal infinities
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    // NaN fails here too
    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckCloseError {
    #[error("values differ at index {index:?}: {left} vs {right} (abs={}, rel={})", .tol.abs, .tol.rel)]
    Value {
        index: Option<usize>,
        left: f64,
        right: f64,
        tol: Tolerances,
    },
    #[error("lengths differ: {left} vs {right}")]
    Length { left: usize, right: usize },
}

impl CheckCloseError {
    fn at(self, i: usize) -> Self {
        match self {
            CheckCloseError::Value { index: None, left, right, tol } => {
                CheckCloseError::Value { index: Some(i), left, right, tol }
            },
            e => e,
        }
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), CheckCloseError> {
        match is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError::Value { index: None, left: *self, right: *other, tol }),
        }
    }
}

impl CheckClose for [f64] {
    fn check_close(&self, other: &[f64], tol: Tolerances) -> Result<(), CheckCloseError> {
        if self.len() != other.len() {
            return Err(CheckCloseError::Length { left: self.len(), right: other.len() });
        }
        for (i, (a, b)) in self.iter().zip(other).enumerate() {
            a.check_close(b, tol).map_err(|e| e.at(i))?;
        }
        Ok(())
    }
}

impl CheckClose for Vec<f64> {
    fn check_close(&self, other: &Vec<f64>, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl CheckClose<[f64]> for Vec<f64> {
    fn check_close(&self, other: &[f64], tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(other, tol) }
}

impl<const N: usize> CheckClose for [f64; N] {
    fn check_close(&self, other: &[f64; N], tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl<'a, T: CheckClose + ?Sized> CheckClose for &'a T {
    fn check_close(&self, other: &&'a T, tol: Tolerances) -> Result<(), CheckCloseError>
    { (**self).check_close(*other, tol) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_forms() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0 + 1e-9);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(abs=1e-8, rel=0.0, 1.0, 1.0,);
        assert_close!(vec![1.0, 2.0], vec![1.0, 2.0]);
        assert_close!([0.5; 3], [0.5; 3]);
    }

    #[test]
    #[should_panic(expected = "not nearly equal")]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    fn reports_index() {
        let tol = Tolerances::abs(1e-3);
        let err = [1.0f64, 2.0, 3.0][..].check_close(&[1.0, 2.5, 3.0][..], tol).unwrap_err();
        match err {
            CheckCloseError::Value { index, .. } => assert_eq!(index, Some(1)),
            e => panic!("unexpected: {}", e),
        }
        assert_eq!(
            [1.0f64][..].check_close(&[1.0, 2.0][..], tol),
            Err(CheckCloseError::Length { left: 1, right: 2 }),
        );
    }

    #[test]
    fn nan_and_infinity() {
        let tol = Tolerances::default();
        assert!(!is_close(f64::NAN, f64::NAN, tol));
        assert!(is_close(f64::INFINITY, f64::INFINITY, tol));
        assert!(!is_close(f64::INFINITY, f64::NEG_INFINITY, tol));
    }
}
