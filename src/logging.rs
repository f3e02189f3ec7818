/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::Result;

use std::fmt;
use std::path::{Path, PathBuf};

use ansi_term::Colour;
use log::{Level, LevelFilter};

/// Builder-style setup for logging to stdout and, optionally, a file.
///
/// ```no_run
/// tbkit::logging::GlobalLogger::default()
///     .path("tbkit.log")
///     .verbosity(1)
///     .apply()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GlobalLogger {
    path: Option<PathBuf>,
    verbosity: Verbosity,
    colored: bool,
}

impl Default for GlobalLogger {
    fn default() -> Self
    { GlobalLogger { path: None, verbosity: Verbosity::Default, colored: true } }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity { Quiet, Default, Loud }

impl GlobalLogger {
    /// Also append the log to this file.
    pub fn path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self
    { self.path = Some(path.as_ref().to_owned()); self }

    /// Negative is quiet, zero is the default, and anything positive
    /// enables trace output from the file readers.
    pub fn verbosity(&mut self, level: i32) -> &mut Self {
        self.verbosity = match level {
            l if l < 0 => Verbosity::Quiet,
            0 => Verbosity::Default,
            _ => Verbosity::Loud,
        };
        self
    }

    /// Colorize the level. (only on stdout; the log file is always plain)
    pub fn colored(&mut self, colored: bool) -> &mut Self
    { self.colored = colored; self }

    fn levels(&self) -> (LevelFilter, LevelFilter) {
        match self.verbosity {
            Verbosity::Quiet => (LevelFilter::Warn, LevelFilter::Warn),
            Verbosity::Default => (LevelFilter::Info, LevelFilter::Debug),
            Verbosity::Loud => (LevelFilter::Debug, LevelFilter::Trace),
        }
    }

    /// Install the logger. This can only succeed once per process.
    pub fn apply(&mut self) -> Result<()> {
        use std::time::Instant;

        let start = Instant::now();
        let (default_level, io_level) = self.levels();
        let dispatch = |colored: bool| {
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let t = start.elapsed();
                    let level = match colored {
                        true => ColorizedLevel(record.level()).to_string(),
                        false => record.level().to_string(),
                    };
                    out.finish(format_args!(
                        "[{:>4}.{:03}s][{}][{}] {}",
                        t.as_secs(),
                        t.subsec_millis(),
                        record.target(),
                        level,
                        message,
                    ))
                })
        };

        let mut fern = fern::Dispatch::new()
            .level(default_level)
            .level_for("tbkit_siesta_io", io_level)
            .level_for("tbkit_operator", io_level)
            .chain(dispatch(self.colored).chain(std::io::stdout()));

        if let Some(path) = self.path.as_ref() {
            let file = fern::log_file(path).map_err(|source| {
                tbkit_fs_util::Error { action: "could not open log file", path: path.clone(), source }
            })?;
            fern = fern.chain(dispatch(false).chain(file));
        }

        fern.apply()?;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);

impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.0 {
            Level::Error => Colour::Red.bold(),
            Level::Warn  => Colour::Red.normal(),
            Level::Info  => Colour::Cyan.bold(),
            Level::Debug => Colour::Yellow.dimmed(),
            Level::Trace => Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(self.0.to_string()))
    }
}
