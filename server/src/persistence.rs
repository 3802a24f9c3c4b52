use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;

use tether_shared::{CompoundTag, Tag};

use crate::error::PersistError;

/// A holder's full storage document kept on disk as JSON, in the same
/// `{ entries: [...] }` shape sync payloads carry. Values are stored
/// type-wrapped (`{"Int": 40}`) so every tag reads back as the type it was.
#[derive(Clone, Debug)]
pub struct SavedStorageFile {
    path: PathBuf,
}

impl SavedStorageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file's contents. The document is written beside the
    /// target first and renamed over it, so a crash never leaves half a file.
    ///
    /// JSON has no NaN or infinity, so a document holding one is refused
    /// and the file is left as it was.
    pub fn write(&self, document: &CompoundTag) -> Result<(), PersistError> {
        if let Some(key) = non_finite_key(document) {
            return Err(PersistError::NonFinite {
                path: self.path.clone(),
                key,
            });
        }
        let bytes = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)?;

        debug!("SavedStorageFile: wrote {}", self.path.display());
        Ok(())
    }

    /// `None` if nothing was saved yet
    pub fn read(&self) -> Result<Option<CompoundTag>, PersistError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Dotted path of the first NaN or infinite float in `compound`
fn non_finite_key(compound: &CompoundTag) -> Option<String> {
    compound
        .iter()
        .find_map(|(key, tag)| non_finite_in(tag).map(|inner| join_key(key, inner)))
}

fn non_finite_in(tag: &Tag) -> Option<Option<String>> {
    match tag {
        Tag::Float(value) if !value.is_finite() => Some(None),
        Tag::Double(value) if !value.is_finite() => Some(None),
        Tag::Compound(compound) => non_finite_key(compound).map(Some),
        Tag::List(tags) => tags.iter().enumerate().find_map(|(index, tag)| {
            non_finite_in(tag).map(|inner| Some(join_key(&index.to_string(), inner)))
        }),
        _ => None,
    }
}

fn join_key(head: &str, tail: Option<String>) -> String {
    match tail {
        Some(tail) => format!("{}.{}", head, tail),
        None => head.to_string(),
    }
}
