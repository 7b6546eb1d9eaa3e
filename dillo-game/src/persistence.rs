//! Save-file adapters: atomic JSON on disk and an in-memory slot.
use log::debug;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::GameStorage;
use crate::state::SaveDocument;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid save document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no save found at {0}")]
    NotFound(String),
}

impl PersistError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Stores the save document as pretty JSON in a single file.
///
/// Writes go to a sibling temp file that is flushed to disk and then renamed
/// over the target, so readers never observe a partial document.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, text: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }
        let tmp = self.temp_path();
        let written = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(text.as_bytes())?;
                file.sync_all()
            })
            .map_err(|e| PersistError::io(&tmp, e))
            .and_then(|()| {
                fs::rename(&tmp, &self.path).map_err(|e| PersistError::io(&self.path, e))
            });
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }
}

impl GameStorage for JsonFileStorage {
    type Error = PersistError;

    fn save_game(&self, document: &SaveDocument) -> Result<(), Self::Error> {
        let text = document.to_json_pretty()?;
        self.write_atomic(&text)?;
        debug!("saved {} bytes to {}", text.len(), self.path.display());
        Ok(())
    }

    fn load_game(&self) -> Result<SaveDocument, Self::Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PersistError::NotFound(self.path.display().to_string()));
            }
            Err(err) => return Err(PersistError::io(&self.path, err)),
        };
        Ok(SaveDocument::from_json(&text)?)
    }

    fn delete_save(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistError::io(&self.path, err)),
        }
    }
}

/// Keeps the serialized document in memory. Useful for tests and headless
/// runs that should not touch the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: RefCell<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently held, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Replace the stored text verbatim, e.g. to simulate a damaged save.
    pub fn overwrite(&self, text: impl Into<String>) {
        *self.slot.borrow_mut() = Some(text.into());
    }
}

impl GameStorage for MemoryStorage {
    type Error = PersistError;

    fn save_game(&self, document: &SaveDocument) -> Result<(), Self::Error> {
        let text = document.to_json_pretty()?;
        *self.slot.borrow_mut() = Some(text);
        Ok(())
    }

    fn load_game(&self) -> Result<SaveDocument, Self::Error> {
        let slot = self.slot.borrow();
        let text = slot
            .as_deref()
            .ok_or_else(|| PersistError::NotFound("memory".to_string()))?;
        Ok(SaveDocument::from_json(text)?)
    }

    fn delete_save(&self) -> Result<(), Self::Error> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}
