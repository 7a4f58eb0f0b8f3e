//! On-disk model store
//!
//! One JSON file per model kind under a single directory. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! concurrent reader sees either the previous model or the new one.

use crate::error::{LoanError, Result};
use crate::training::{ModelKind, TrainedModel};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Directory of persisted models, keyed by kind
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Open the store, creating the directory if it does not exist
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened model store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: ModelKind) -> PathBuf {
        self.root.join(format!("{}.json", kind))
    }

    pub fn exists(&self, kind: ModelKind) -> bool {
        self.path_for(kind).is_file()
    }

    /// Persist `model`, replacing any previous model of the same kind
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let kind = model.kind();
        let path = self.path_for(kind);
        let json = serde_json::to_vec(model)?;

        self.write_atomic(&path, &json)?;

        info!(model = %kind, path = %path.display(), bytes = json.len(), "Saved model");
        Ok(())
    }

    /// Persist several models as one unit.
    ///
    /// Every model is serialized and synced to a temporary file before any
    /// file is renamed into place. If a rename fails, the files already
    /// replaced in this call are restored to their previous contents (or
    /// removed if there were none), so the store keeps describing a single
    /// training run.
    pub fn save_all<'a, I>(&self, models: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TrainedModel>,
    {
        let mut staged = Vec::new();
        for model in models {
            let json = serde_json::to_vec(model)?;
            let tmp = self.stage(&json)?;
            staged.push((model.kind(), tmp, json.len()));
        }

        let mut replaced: Vec<(ModelKind, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
        for (kind, tmp, bytes) in staged {
            let path = self.path_for(kind);
            let previous = match fs::read(&path) {
                Ok(previous) => Some(previous),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    self.rollback(&replaced);
                    return Err(e.into());
                }
            };

            if let Err(e) = tmp.persist(&path) {
                self.rollback(&replaced);
                return Err(LoanError::IoError(e.error));
            }
            replaced.push((kind, previous));
            info!(model = %kind, path = %path.display(), bytes, "Saved model");
        }

        Ok(())
    }

    /// Write `bytes` to a synced temporary file inside the store directory
    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.stage(bytes)?
            .persist(path)
            .map_err(|e| LoanError::IoError(e.error))?;
        Ok(())
    }

    fn rollback(&self, replaced: &[(ModelKind, Option<Vec<u8>>)]) {
        for (kind, previous) in replaced.iter().rev() {
            let path = self.path_for(*kind);
            let restored = match previous {
                Some(bytes) => self.write_atomic(&path, bytes),
                None => fs::remove_file(&path).map_err(LoanError::from),
            };
            match restored {
                Ok(()) => warn!(model = %kind, "Rolled back model file"),
                Err(e) => error!(model = %kind, error = %e, "Failed to roll back model file"),
            }
        }
    }

    /// Load the model of `kind`. A missing file means it was never trained.
    pub fn load(&self, kind: ModelKind) -> Result<TrainedModel> {
        let path = self.path_for(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoanError::ModelNotTrained(kind));
            }
            Err(e) => return Err(e.into()),
        };

        let model: TrainedModel = serde_json::from_slice(&bytes)?;
        if model.kind() != kind {
            return Err(LoanError::SerializationError(format!(
                "{} holds a '{}' model",
                path.display(),
                model.kind()
            )));
        }
        Ok(model)
    }

    /// Availability of every kind, in `ModelKind::ALL` order
    pub fn available(&self) -> Vec<(ModelKind, bool)> {
        ModelKind::ALL.iter().map(|&k| (k, self.exists(k))).collect()
    }
}
