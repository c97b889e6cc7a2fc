//! Object storage: artifacts keyed by the content hash of their source.
//!
//! An artifact produced for a work item (a plot, a generated page) is stored
//! at `objects/<sha256(source id)>/<name>`, so every artifact for the same
//! source shares a prefix regardless of what characters the id contains.

use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::{Result, Storage, StorageError};

/// Hex-encoded SHA-256 of a source identifier.
pub fn content_key(source_id: &str) -> String {
    hex::encode(Sha256::digest(source_id.as_bytes()))
}

impl Storage {
    /// Writes an artifact, replacing any previous one. Returns its path.
    pub fn put_object(&self, source_id: &str, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.object_path(source_id, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Reads an artifact back.
    pub fn get_object(&self, source_id: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.object_path(source_id, name)?;
        if !path.is_file() {
            return Err(StorageError::ObjectNotFound(path));
        }
        Ok(fs::read(path)?)
    }

    /// Lists the artifact names stored for a source, sorted.
    pub fn list_objects(&self, source_id: &str) -> Result<Vec<String>> {
        let dir = self.objects_dir().join(content_key(source_id));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Where an artifact lives. The name must be a plain file name.
    pub fn object_path(&self, source_id: &str, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidObjectName(name.to_string()));
        }
        Ok(self.objects_dir().join(content_key(source_id)).join(name))
    }
}
