/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Error, FcSile, Forces, HsxSile, ReadSettings, Result};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tbkit_operator::{ForceConstants, Hamiltonian, Overlap};
use tbkit_structure::{Geometry, Lattice};

/// A file of some known format.
///
/// Every operation defaults to `Error::Unsupported`; each format overrides
/// the ones it can serve. All energies are in eV and lengths in Angstrom.
pub trait Sile: fmt::Debug {
    fn path(&self) -> &Path;

    /// Short name of the format, for messages.
    fn format(&self) -> &'static str;

    fn read_geometry(&self) -> Result<Geometry>
    { Err(self.unsupported("read_geometry")) }

    fn read_lattice(&self) -> Result<Lattice>
    { Err(self.unsupported("read_lattice")) }

    /// Read the Hamiltonian (with overlap), attached to `geometry` if given
    /// or else to the geometry stored in the file.
    fn read_hamiltonian(&self, geometry: Option<&Geometry>) -> Result<Hamiltonian> {
        let _ = geometry;
        Err(self.unsupported("read_hamiltonian"))
    }

    fn read_overlap(&self, geometry: Option<&Geometry>) -> Result<Overlap> {
        let _ = geometry;
        Err(self.unsupported("read_overlap"))
    }

    /// `Ok(None)` if the file may lack one and does.
    fn read_fermi_level(&self) -> Result<Option<f64>>
    { Err(self.unsupported("read_fermi_level")) }

    fn read_force_constant(&self, na: Option<usize>) -> Result<ForceConstants> {
        let _ = na;
        Err(self.unsupported("read_force_constant"))
    }

    fn read_force(&self, displacement: Option<f64>, na: Option<usize>) -> Result<Forces> {
        let _ = (displacement, na);
        Err(self.unsupported("read_force"))
    }

    #[doc(hidden)]
    fn unsupported(&self, operation: &'static str) -> Error
    { Error::Unsupported { format: self.format(), operation } }
}

pub type SileConstructor = fn(&Path, &ReadSettings) -> Box<dyn Sile>;

fn hsx(path: &Path, settings: &ReadSettings) -> Box<dyn Sile>
{ Box::new(HsxSile::with_settings(path, settings.clone())) }

fn fc(path: &Path, settings: &ReadSettings) -> Box<dyn Sile>
{ Box::new(FcSile::with_settings(path, settings.clone())) }

/// Picks a sile by file extension.
///
/// Extensions are matched case-insensitively, after removing a trailing `.gz`.
/// A file without an extension is looked up by its whole name.
#[derive(Clone)]
pub struct SileRegistry {
    settings: ReadSettings,
    map: BTreeMap<String, SileConstructor>,
}

impl fmt::Debug for SileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SileRegistry")
            .field("settings", &self.settings)
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl SileRegistry {
    /// A registry that knows nothing.
    pub fn new(settings: ReadSettings) -> Self
    { SileRegistry { settings, map: BTreeMap::new() } }

    /// A registry with every format in this crate.
    pub fn siesta(settings: ReadSettings) -> Self {
        let mut registry = SileRegistry::new(settings);
        registry.register("hsx", hsx);
        registry.register("fc", fc);
        registry.register("fcc", fc);
        registry
    }

    /// Register (or replace) the constructor for an extension.
    pub fn register(&mut self, extension: &str, constructor: SileConstructor) -> &mut Self {
        let key = extension.trim_start_matches('.').to_lowercase();
        if self.map.insert(key.clone(), constructor).is_some() {
            debug!("replacing the sile registered for '{}'", key);
        }
        self
    }

    pub fn settings(&self) -> &ReadSettings
    { &self.settings }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str>
    { self.map.keys().map(|s| s.as_str()).collect() }

    pub fn get_sile<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Sile>> {
        let path = path.as_ref();
        let constructor = lookup_key(path)
            .and_then(|key| self.map.get(&key))
            .ok_or_else(|| Error::UnknownExtension(path.to_owned()))?;
        let sile = constructor(path, &self.settings);
        trace!("'{}' is a {} file", path.display(), sile.format());
        Ok(sile)
    }
}

fn lookup_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    let name = match tbkit_fs_util::has_gz_extension(path) {
        true => name[..name.len() - ".gz".len()].to_string(),
        false => name,
    };
    let key = match name.rfind('.') {
        Some(i) => &name[i + 1..],
        None => &name[..],
    };
    match key.is_empty() {
        true => None,
        false => Some(key.to_string()),
    }
}
