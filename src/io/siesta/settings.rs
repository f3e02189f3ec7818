/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

#![allow(non_snake_case)]

use crate::Result;

use std::io::Read;

use serde::{Deserialize, Serialize};

/// Reads YAML through `serde_ignored`, warning about every unrecognized key.
pub trait YamlRead: for <'de> Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self> {
        let mut s = String::new();
        r.read_to_string(&mut s)?;
        Self::from_str(&s)
    }

    fn from_str(s: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(s)?;
        match Self::__serde_ignored__from_value(value) {
            Ok(out) => Ok(out),
            Err(_) => {
                // serde_ignored loses the location; parse again for a better message
                Self::__serde_yaml__from_str(s)?;
                unreachable!();
            },
        }
    }

    #[doc(hidden)]
    fn __serde_ignored__from_value(value: serde_yaml::Value) -> Result<Self>;
    #[doc(hidden)]
    fn __serde_yaml__from_str(s: &str) -> Result<Self>;
}

macro_rules! derive_yaml_read {
    ($Type:ty) => {
        impl crate::YamlRead for $Type {
            fn __serde_ignored__from_value(value: serde_yaml::Value) -> crate::Result<$Type> {
                serde_ignored::deserialize(
                    value,
                    |path| warn!("Unused config item (possible typo?): {}", path),
                ).map_err(Into::into)
            }

            fn __serde_yaml__from_str(s: &str) -> crate::Result<$Type> {
                serde_yaml::from_str(s).map_err(Into::into)
            }
        }
    };
}

/// Knobs shared by all readers.
///
/// ```yaml
/// strict: false
/// fix-orbitals: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct ReadSettings {
    /// Turn recoverable problems (such as a missing Fermi level) into errors.
    pub strict: bool,
    /// When a supplied geometry disagrees with a file about the orbitals
    /// per atom, use the file's counts instead of failing.
    pub fix_orbitals: bool,
}

impl Default for ReadSettings {
    fn default() -> Self
    { ReadSettings { strict: false, fix_orbitals: true } }
}

derive_yaml_read!{ReadSettings}
