/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Filesystem helpers that add the path to every error,
//! and that hide gzip compression from readers and writers.

#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// The first two bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
#[error("{action} '{}': {source}", .path.display())]
pub struct Error {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

pub type Result<T> = std::result::Result<T, Error>;

fn with_path<T>(action: &'static str, path: &Path, r: io::Result<T>) -> Result<T>
{ r.map_err(|source| Error { action, path: path.to_owned(), source }) }

/// Wrapper around `File::open` that adds context.
pub fn open<P: AsRef<Path>>(path: P) -> Result<File>
{
    let path = path.as_ref();
    with_path("while opening file", path, File::open(path))
}

/// Wrapper around `File::create` that adds context.
pub fn create<P: AsRef<Path>>(path: P) -> Result<File>
{
    let path = path.as_ref();
    with_path("could not create file", path, File::create(path))
}

/// Whether a path names a gzipped file by its extension. (case-insensitive)
pub fn has_gz_extension<P: AsRef<Path>>(path: P) -> bool
{
    path.as_ref().extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
}

/// Opens a file for buffered reading, decompressing it if it is gzipped.
///
/// Compression is detected from the content (the gzip magic number), not the
/// file name, so a renamed `.gz` file still reads correctly.
pub fn open_decompressed<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>>
{
    let path = path.as_ref();
    let mut file = BufReader::new(open(path)?);
    let is_gzip = {
        let head = with_path("while reading file", path, file.fill_buf())?;
        head.len() >= 2 && head[..2] == GZIP_MAGIC
    };
    match is_gzip {
        true => {
            trace!("decompressing '{}'", path.display());
            Ok(Box::new(BufReader::new(GzDecoder::new(file))))
        },
        false => Ok(Box::new(file)),
    }
}

/// Reads an entire (possibly gzipped) file into memory.
pub fn read_decompressed<P: AsRef<Path>>(path: P) -> Result<Vec<u8>>
{
    let path = path.as_ref();
    let mut bytes = vec![];
    let mut reader = open_decompressed(path)?;
    with_path("while reading file", path, reader.read_to_end(&mut bytes))?;
    Ok(bytes)
}

/// A writer that gzips its output if its path ends in `.gz`.
///
/// Call [`CompressedWriter::finish`] to flush everything and observe errors;
/// a dropped writer flushes on a best-effort basis.
pub struct CompressedWriter {
    path: PathBuf,
    inner: Inner,
}

enum Inner {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Creates a file for writing, compressing it when the path ends in `.gz`.
pub fn create_compressed<P: AsRef<Path>>(path: P) -> Result<CompressedWriter>
{
    let path = path.as_ref();
    let file = BufWriter::new(create(path)?);
    let inner = match has_gz_extension(path) {
        true => Inner::Gzip(GzEncoder::new(file, Compression::default())),
        false => Inner::Plain(file),
    };
    Ok(CompressedWriter { path: path.to_owned(), inner })
}

impl CompressedWriter {
    pub fn path(&self) -> &Path
    { &self.path }

    pub fn finish(self) -> Result<()>
    {
        let CompressedWriter { path, inner } = self;
        let result = match inner {
            Inner::Plain(mut w) => w.flush(),
            Inner::Gzip(w) => w.finish().and_then(|mut w| w.flush()),
        };
        with_path("could not finish writing", &path, result)
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Plain(w) => w.write(buf),
            Inner::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Plain(w) => w.flush(),
            Inner::Gzip(w) => w.flush(),
        }
    }
}
