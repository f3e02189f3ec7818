/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::fmt;
use std::str;

/// A chemical element, by atomic number.
///
/// Only elements with a symbol in the table (1 through 118) exist.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Element(u8);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element symbol: {0:?}")]
pub struct ElementParseError(String);

impl Element {
    pub fn from_atomic_number(n: u32) -> Option<Self> {
        match 1 <= n && n as usize <= SYMBOLS.len() {
            true => Some(Element(n as u8)),
            false => None,
        }
    }

    /// Case-insensitive symbol lookup.
    pub fn from_symbol(s: &str) -> Result<Self, ElementParseError> {
        SYMBOLS.iter()
            .position(|sym| sym.eq_ignore_ascii_case(s))
            .map(|i| Element(i as u8 + 1))
            .ok_or_else(|| ElementParseError(s.to_string()))
    }

    pub fn atomic_number(&self) -> u32
    { self.0.into() }

    pub fn symbol(&self) -> &'static str
    { SYMBOLS[self.0 as usize - 1] }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Display::fmt(self.symbol(), f) }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Debug::fmt(self.symbol(), f) }
}

impl str::FromStr for Element {
    type Err = ElementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    { Element::from_symbol(s.trim()) }
}

const SYMBOLS: [&str; 118] = [
    "H",                                                                                  "He",
    "Li", "Be",                                                   "B",  "C",  "N",  "O",  "F",  "Ne",
    "Na", "Mg",                                                   "Al", "Si", "P",  "S",  "Cl", "Ar",
    "K",  "Ca", "Sc", "Ti", "V",  "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y",  "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I",  "Xe",
    "Cs", "Ba",
    "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
    "Hf", "Ta", "W",  "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra",
    "Ac", "Th", "Pa", "U",  "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr",
    "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(Element::from_atomic_number(6).unwrap().symbol(), "C");
        assert_eq!(Element::from_atomic_number(79).unwrap().symbol(), "Au");
        assert_eq!(Element::from_atomic_number(118).unwrap().symbol(), "Og");
        assert_eq!(Element::from_atomic_number(0), None);
        assert_eq!(Element::from_atomic_number(119), None);

        assert_eq!("fe".parse::<Element>().unwrap().atomic_number(), 26);
        assert_eq!(Element::from_symbol("MO").unwrap().atomic_number(), 42);
        assert!(Element::from_symbol("Xx").is_err());
    }
}
