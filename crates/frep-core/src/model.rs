#![forbid(unsafe_code)]

//! Backing data model for repeated fields.
//!
//! The engine only ever talks to a [`ModelStore`]: it reads a value by its
//! effective field name and writes one back. Writes are immediate, there is
//! no batching or rollback, and the last write wins.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        RepeaterTree                           │
//! │   - persist / change / clear  → set_value(name, value)       │
//! │   - sync-to-view / populate   → get_value(name)              │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ModelStore                             │
//! │   - MemoryModel: in-memory map + write log (testing)          │
//! │   - FileModel: JSON file (requires `json`)                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `ModelError::Io` | File I/O failure | `open`/`save` return the error, memory state unaffected |
//! | `ModelError::Serialization` | JSON encode/decode | `open` fails; caller decides |
//! | Version mismatch | Old/new file format | Logged, stored values ignored |
//! | Missing entry | First run, renamed field | `get_value` returns `None` |

use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised by file-backed model stores.
#[derive(Debug)]
pub enum ModelError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    #[cfg(feature = "json")]
    Serialization(String),
    /// Stored data is not a name → value map.
    Corruption(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "json")]
            ModelError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            ModelError::Corruption(msg) => write!(f, "model corruption: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            #[cfg(feature = "json")]
            ModelError::Serialization(_) => None,
            ModelError::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

/// Result type for model store operations.
pub type ModelResult<T> = Result<T, ModelError>;

// ─────────────────────────────────────────────────────────────────────────────
// Model Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Narrow read/write contract the engine needs from a data model.
///
/// Names are effective field names (`street[1][0]`), values are strings. An
/// absent entry and an empty string are distinct on read, but the engine
/// treats both as blank.
pub trait ModelStore {
    /// Read the value stored under `name`.
    fn get_value(&self, name: &str) -> Option<String>;

    /// Store `value` under `name`, replacing any previous value.
    fn set_value(&mut self, name: &str, value: &str);
}

impl<M: ModelStore + ?Sized> ModelStore for Box<M> {
    fn get_value(&self, name: &str) -> Option<String> {
        (**self).get_value(name)
    }

    fn set_value(&mut self, name: &str, value: &str) {
        (**self).set_value(name, value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Model (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory model store.
///
/// Besides the current values it keeps an ordered log of every write, which
/// is what tests assert against: the engine's contract is expressed in terms
/// of which writes happen and in what order.
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    values: HashMap<String, String>,
    writes: Vec<(String, String)>,
}

impl MemoryModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model pre-populated with values. The write log starts empty.
    #[must_use]
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            writes: Vec::new(),
        }
    }

    /// Current value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Every write since creation (or the last [`take_writes`](Self::take_writes)).
    #[must_use]
    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }

    /// Drain the write log.
    pub fn take_writes(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.writes)
    }

    /// Whether any write targeted `name` with exactly `value`.
    #[must_use]
    pub fn was_written(&self, name: &str, value: &str) -> bool {
        self.writes.iter().any(|(n, v)| n == name && v == value)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values sorted by name.
    #[must_use]
    pub fn sorted(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ModelStore for MemoryModel {
    fn get_value(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set_value(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
        self.writes.push((name.to_string(), value.to_string()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Model (requires json feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "json")]
mod file_model {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// On-disk format.
    #[derive(Serialize, Deserialize)]
    struct ModelFile {
        /// Format version for future migrations.
        format_version: u32,
        /// Effective field name → value.
        values: BTreeMap<String, String>,
    }

    impl ModelFile {
        const FORMAT_VERSION: u32 = 1;
    }

    /// JSON file-backed model store.
    ///
    /// Values are held in memory and written back by [`save`](Self::save).
    ///
    /// # File Format
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "values": {
    ///     "item": "2",
    ///     "name[0]": "Ada",
    ///     "name[1]": "Grace"
    ///   }
    /// }
    /// ```
    ///
    /// # Atomic Writes
    ///
    /// 1. Write to `{path}.tmp`
    /// 2. Flush and sync
    /// 3. Rename `{path}.tmp` -> `{path}`
    pub struct FileModel {
        path: PathBuf,
        inner: MemoryModel,
        dirty: bool,
    }

    impl FileModel {
        /// Open the model at `path`. A missing file yields an empty model.
        pub fn open(path: impl AsRef<Path>) -> ModelResult<Self> {
            let path = path.as_ref().to_path_buf();
            if !path.exists() {
                return Ok(Self {
                    path,
                    inner: MemoryModel::new(),
                    dirty: false,
                });
            }

            if fs::metadata(&path)?.len() == 0 {
                return Err(ModelError::Corruption(format!(
                    "{} is empty",
                    path.display()
                )));
            }

            let reader = BufReader::new(File::open(&path)?);
            let file: ModelFile = serde_json::from_reader(reader).map_err(|e| {
                ModelError::Serialization(format!("failed to parse model file: {e}"))
            })?;

            let inner = if file.format_version == ModelFile::FORMAT_VERSION {
                MemoryModel::with_values(file.values)
            } else {
                crate::warn!(
                    stored = file.format_version,
                    expected = ModelFile::FORMAT_VERSION,
                    "model file format version mismatch, ignoring stored values"
                );
                MemoryModel::new()
            };

            Ok(Self {
                path,
                inner,
                dirty: false,
            })
        }

        /// Path of the backing file.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// In-memory view of the values, including the write log.
        #[must_use]
        pub fn memory(&self) -> &MemoryModel {
            &self.inner
        }

        /// Whether values changed since the last load or save.
        #[must_use]
        pub fn is_dirty(&self) -> bool {
            self.dirty
        }

        /// Write values back to disk.
        ///
        /// Returns `Ok(true)` if data was written, `Ok(false)` if nothing changed.
        pub fn save(&mut self) -> ModelResult<bool> {
            if !self.dirty {
                return Ok(false);
            }

            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }

            let file = ModelFile {
                format_version: ModelFile::FORMAT_VERSION,
                values: self.inner.sorted(),
            };

            let tmp_path = self.temp_path();
            {
                let handle = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(handle);
                serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                    ModelError::Serialization(format!("failed to serialize model: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;

            crate::debug!(
                path = %self.path.display(),
                entries = file.values.len(),
                "saved model"
            );
            self.dirty = false;
            Ok(true)
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }
    }

    impl ModelStore for FileModel {
        fn get_value(&self, name: &str) -> Option<String> {
            self.inner.get_value(name)
        }

        fn set_value(&mut self, name: &str, value: &str) {
            self.inner.set_value(name, value);
            self.dirty = true;
        }
    }

    impl fmt::Debug for FileModel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileModel")
                .field("path", &self.path)
                .field("entries", &self.inner.len())
                .field("dirty", &self.dirty)
                .finish()
        }
    }
}

#[cfg(feature = "json")]
pub use file_model::FileModel;
