use super::{StorageBackend, Tables};
use crate::error::{AttrError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DATA_FILENAME: &str = "attributes.json";

/// File-based backend: all tables live in `<root>/attributes.json`.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILENAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(AttrError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Tables> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(Tables::default());
        }
        let content = fs::read_to_string(data_file).map_err(AttrError::Io)?;
        let tables: Tables = serde_json::from_str(&content).map_err(AttrError::Serialization)?;
        Ok(tables)
    }

    fn store(&self, tables: &Tables) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(tables).map_err(AttrError::Serialization)?;

        // Write to a sibling temp file, then rename over the data file.
        let tmp_file = self.root.join(format!(".attributes-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(AttrError::Io)?;
        if let Err(e) = fs::rename(&tmp_file, self.data_file()) {
            let _ = fs::remove_file(&tmp_file);
            return Err(AttrError::Io(e));
        }
        Ok(())
    }
}
