//! [`Loader`] — decouples the parsers and renderers in this crate from
//! `std::fs`, the way the teacher's content-source abstraction decouples its
//! readers from a particular archive format.

use crate::error::Result;
use camino::Utf8Path;
use std::fs;
use std::io::Write;

/// A source/sink for the text files this crate reads and writes. Every
/// public parse/render entry point takes a `&dyn Loader` rather than calling
/// `std::fs` directly, so callers can substitute an in-memory or archive-
/// backed implementation in tests and embedding scenarios.
pub trait Loader {
    fn read_to_string(&self, path: &Utf8Path) -> Result<String>;
    fn write_string(&self, path: &Utf8Path, contents: &str) -> Result<()>;
}

/// The default [`Loader`]: reads and writes ordinary files on disk. Writes
/// go through a temp-file-then-rename so a crash or interrupted write never
/// leaves a project file truncated.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl Loader for FsLoader {
    fn read_to_string(&self, path: &Utf8Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| anyhow::Error::from(e).into())
    }

    fn write_string(&self, path: &Utf8Path, contents: &str) -> Result<()> {
        let dir = path.parent().unwrap_or(Utf8Path::new("."));
        let write = || -> anyhow::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(contents.as_bytes())?;
            tmp.flush()?;
            tmp.persist(path)?;
            Ok(())
        };
        write().map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("project.pbxproj");
        let loader = FsLoader;
        loader.write_string(&path, "// hello\n").unwrap();
        assert_eq!(loader.read_to_string(&path).unwrap(), "// hello\n");
    }
}
