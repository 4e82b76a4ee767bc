//! @acp:module "Filesystem"
//! @acp:summary "File access seam with atomic replacement"
//! @acp:domain cli
//! @acp:layer io
//!
//! Kept behind a trait so resolver logic can be exercised against an
//! in-memory tree instead of `/etc`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SoError};

pub trait Filesystem: Send + Sync {
    /// Read a file to a string; a missing file is [`SoError::FileNotFound`]
    fn get(&self, path: &Path) -> Result<String>;

    fn exists(&self, path: &Path) -> bool;

    /// Atomically replace (or create) `path` with `content`, creating
    /// missing parent directories
    fn replace(&self, path: &Path, content: &str) -> Result<()>;

    fn delete(&self, path: &Path) -> Result<()>;

    /// Create an empty temp file that outlives this call
    fn temp_file(&self, prefix: &str) -> Result<PathBuf>;
}

/// The real disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn get(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SoError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => SoError::Io(e),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn replace(&self, path: &Path, content: &str) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        std::fs::create_dir_all(dir)?;

        // Staged in the same directory so the final rename stays on one filesystem.
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| SoError::Io(e.error))?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(SoError::Io(e)),
            _ => Ok(()),
        }
    }

    fn temp_file(&self, prefix: &str) -> Result<PathBuf> {
        let file = tempfile::Builder::new().prefix(prefix).tempfile()?;
        file.into_temp_path()
            .keep()
            .map_err(|e| SoError::Io(e.error))
    }
}
