use berth_manifest::BaseEnvironment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const METADATA_FILE: &str = "layer.json";
const SITE_PACKAGES: &str = "site-packages";
const LAYER_SUFFIX: &str = "-deps";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt layer metadata {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Content address of a dependency layer.
///
/// Covers the base environment, the system package list and the raw bytes of
/// the manifest and every file it includes (installer option lines included).
/// Source files never take part, so source-only edits keep the key stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerKey(String);

impl LayerKey {
    pub fn compute<I>(base: &BaseEnvironment, system_packages: &[String], manifests: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        // Length-prefix each field so adjacent values cannot run together.
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        field(base.to_string().as_bytes());
        field((system_packages.len() as u64).to_le_bytes().as_slice());
        for package in system_packages {
            field(package.as_bytes());
        }
        for manifest in manifests {
            field(manifest.as_ref());
        }

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, used in directory names.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Written last; its presence marks a layer as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    pub key: LayerKey,
    pub base: String,
    pub requirements: usize,
    pub created_at: DateTime<Utc>,
}

/// Manages the content-addressed dependency layers
pub struct LayerStore {
    root: PathBuf,
}

impl LayerStore {
    /// Initialize the layer store at the given root path
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path format: <root>/<short-key>-deps
    pub fn calculate_path(&self, key: &LayerKey) -> PathBuf {
        self.root.join(format!("{}{}", key.short(), LAYER_SUFFIX))
    }

    /// Directory the installer writes packages into
    pub fn site_packages(&self, key: &LayerKey) -> PathBuf {
        self.calculate_path(key).join(SITE_PACKAGES)
    }

    /// True only when the layer was committed under this exact key
    pub fn is_complete(&self, key: &LayerKey) -> bool {
        matches!(
            self.read_metadata(&self.calculate_path(key)),
            Ok(Some(meta)) if &meta.key == key
        )
    }

    /// Creates an empty layer, discarding any leftovers of an interrupted install
    pub fn prepare(&self, key: &LayerKey) -> Result<PathBuf, StoreError> {
        let path = self.calculate_path(key);
        if path.exists() {
            tracing::warn!(layer = %key.short(), "discarding incomplete layer");
            fs::remove_dir_all(&path).map_err(io_err(&path))?;
        }

        let site = path.join(SITE_PACKAGES);
        fs::create_dir_all(&site).map_err(io_err(&site))?;
        Ok(path)
    }

    /// Marks a prepared layer as complete
    pub fn commit(&self, meta: &LayerMetadata) -> Result<(), StoreError> {
        let path = self.calculate_path(&meta.key).join(METADATA_FILE);
        let content = serde_json::to_vec_pretty(meta).map_err(|source| StoreError::Metadata {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, content).map_err(io_err(&path))
    }

    pub fn discard(&self, key: &LayerKey) -> Result<(), StoreError> {
        let path = self.calculate_path(key);
        if path.exists() {
            fs::remove_dir_all(&path).map_err(io_err(&path))?;
        }
        Ok(())
    }

    /// List all complete layers, newest first
    pub fn list(&self) -> Result<Vec<LayerMetadata>, StoreError> {
        let mut layers = Vec::new();
        if !self.root.exists() {
            return Ok(layers);
        }

        for entry in fs::read_dir(&self.root).map_err(io_err(&self.root))? {
            let entry = entry.map_err(io_err(&self.root))?;
            let is_layer = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(LAYER_SUFFIX));
            if !is_layer {
                continue;
            }
            if let Some(meta) = self.read_metadata(&entry.path())? {
                layers.push(meta);
            }
        }

        layers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(layers)
    }

    /// Removes every layer directory except `keep`. Returns how many were removed.
    pub fn prune(&self, keep: Option<&LayerKey>) -> Result<usize, StoreError> {
        if !self.root.exists() {
            return Ok(0);
        }

        let keep_path = keep.map(|k| self.calculate_path(k));
        let mut removed = 0;
        for entry in fs::read_dir(&self.root).map_err(io_err(&self.root))? {
            let path = entry.map_err(io_err(&self.root))?.path();
            let is_layer = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.ends_with(LAYER_SUFFIX));
            if !is_layer || keep_path.as_deref() == Some(path.as_path()) {
                continue;
            }
            fs::remove_dir_all(&path).map_err(io_err(&path))?;
            removed += 1;
        }
        Ok(removed)
    }

    fn read_metadata(&self, layer_dir: &Path) -> Result<Option<LayerMetadata>, StoreError> {
        let path = layer_dir.join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(&path).map_err(io_err(&path))?;
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| StoreError::Metadata { path, source })
    }
}
