//! App-managed audio file library.
//!
//! Loading a clip first imports it: the source file is copied into a library
//! directory under the user's data dir (typically ~/.local/share/abit/library,
//! `XDG_DATA_HOME` override honored). Playback and persisted configuration
//! always reference the stable library path. An inaccessible source fails
//! the import without leaving partial state behind.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::engine::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct FileLibrary {
    root: PathBuf,
}

impl FileLibrary {
    /// Library rooted in the user data directory.
    pub fn new() -> std::result::Result<Self, Box<dyn Error>> {
        let data_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data).join("abit")
        } else {
            dirs::data_dir()
                .ok_or("Unable to find data directory")?
                .join("abit")
        };
        Ok(Self {
            root: data_dir.join("library"),
        })
    }

    /// Library rooted at an explicit directory (used by tests).
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a source file into the library and return its stable path.
    ///
    /// Importing a file that already lives in the library is a no-op.
    pub fn import(&self, source: &Path) -> Result<PathBuf> {
        if source.starts_with(&self.root) {
            return Ok(source.to_path_buf());
        }

        let name = source.file_name().ok_or_else(|| EngineError::FileAccess {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a file path"),
        })?;

        fs::create_dir_all(&self.root).map_err(|e| EngineError::FileAccess {
            path: self.root.clone(),
            source: e,
        })?;

        let dest = self.root.join(name);
        if let Err(e) = fs::copy(source, &dest) {
            // Don't leave a partial copy behind.
            let _ = fs::remove_file(&dest);
            return Err(EngineError::FileAccess {
                path: source.to_path_buf(),
                source: e,
            });
        }

        log::info!("imported {} into library", source.display());
        Ok(dest)
    }
}
