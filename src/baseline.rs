//! Baseline store
//!
//! The baseline is a plain text file holding one decimal ratio, e.g. `0.4521`.
//! It always reflects the last measured coverage, never an average or maximum.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::coverage::CoverageRatio;

/// Default baseline location, relative to the project directory
pub const DEFAULT_BASELINE_PATH: &str = ".coverage-baseline";

/// Errors that can occur during baseline operations
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("baseline {} is corrupt: {content:?} is not a ratio in [0, 1]", .path.display())]
    Corrupt { path: PathBuf, content: String },

    #[error("baseline {} could not be accessed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes the single stored coverage ratio
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored ratio, returning `None` if no baseline exists yet
    pub fn load(&self) -> Result<Option<CoverageRatio>, BaselineError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(BaselineError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match CoverageRatio::parse(&content) {
            Some(ratio) => Ok(Some(ratio)),
            None => Err(BaselineError::Corrupt {
                path: self.path.clone(),
                content: content.trim().to_string(),
            }),
        }
    }

    /// Overwrite the baseline with `ratio`.
    ///
    /// Writes to a temporary file in the same directory and renames it over the
    /// target so a concurrent reader never sees a half-written value.
    pub fn save(&self, ratio: CoverageRatio) -> Result<(), BaselineError> {
        let io_err = |source| BaselineError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        writeln!(tmp, "{}", ratio).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }

    /// Remove the baseline; succeeds if it was already absent
    pub fn clear(&self) -> Result<bool, BaselineError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(BaselineError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> BaselineStore {
        BaselineStore::new(dir.path().join(DEFAULT_BASELINE_PATH))
    }

    #[test]
    fn test_load_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        for value in [0.0, 0.05, 0.3, 0.4521, 0.123456789, 1.0] {
            let ratio = CoverageRatio::new(value).unwrap();
            store.save(ratio).unwrap();
            assert_eq!(store.load().unwrap(), Some(ratio));
        }
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.save(CoverageRatio::new(0.9).unwrap()).unwrap();
        store.save(CoverageRatio::new(0.2).unwrap()).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.trim(), "0.2");
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = BaselineStore::new(dir.path().join("ci/state/baseline"));

        store.save(CoverageRatio::new(0.5).unwrap()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_baseline() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "not a number\n").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, BaselineError::Corrupt { ref content, .. } if content == "not a number"));
    }

    #[test]
    fn test_out_of_range_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "45").unwrap();

        assert!(matches!(store.load(), Err(BaselineError::Corrupt { .. })));
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(!store.clear().unwrap());
        store.save(CoverageRatio::new(0.5).unwrap()).unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }
}
