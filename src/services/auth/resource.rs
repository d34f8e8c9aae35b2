//! Bundled resource lookup.
//!
//! The verification key may ship with the deployment as a plain-text resource.
//! Lookup goes through `ResourceReader` so the key provider does not care where
//! the bytes come from (a directory next to the binary, or bytes compiled in).

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Reads a named resource bundled with the deployment.
///
/// `io::ErrorKind::NotFound` means "not bundled"; any other error means the
/// resource exists but could not be read.
pub trait ResourceReader: Send + Sync {
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Human-readable location of `name`, used in log lines.
    fn describe(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Resources resolved relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsResourceReader {
    root: PathBuf,
}

impl FsResourceReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        // Resource names are flat or nested relative names; never escape the root.
        let rel = Path::new(name);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource name must be relative: {name}"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

impl ResourceReader for FsResourceReader {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(name)?)
    }

    fn describe(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }
}

/// Fixed in-memory resources (e.g. a key embedded with `include_str!`).
#[derive(Debug, Clone, Default)]
pub struct StaticResourceReader {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticResourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }
}

impl ResourceReader for StaticResourceReader {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name} not bundled")))
    }

    fn describe(&self, name: &str) -> String {
        format!("static:{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_reader_reads_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pubkey.txt"), b"KEY").unwrap();

        let reader = FsResourceReader::new(dir.path());
        assert_eq!(reader.read("pubkey.txt").unwrap(), b"KEY");
    }

    #[test]
    fn fs_reader_reports_missing_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FsResourceReader::new(dir.path());

        let err = reader.read("pubkey.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn fs_reader_rejects_names_escaping_root() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FsResourceReader::new(dir.path());

        let err = reader.read("../pubkey.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = reader.read("/etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn static_reader_returns_fixed_bytes_or_absence() {
        let reader = StaticResourceReader::new().with("pubkey.txt", "KEY");

        assert_eq!(reader.read("pubkey.txt").unwrap(), b"KEY");
        assert_eq!(
            reader.read("other.txt").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
