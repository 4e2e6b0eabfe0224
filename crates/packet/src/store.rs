//! JSON record stores
//!
//! Each store is one JSON object keyed by record id. Reads are lenient and
//! writes replace the file atomically (temp file in the same directory, then
//! rename), so a concurrent reader sees either the old or the new document.

use crate::{PacketError, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One JSON object file
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store
    ///
    /// A missing or empty file is an empty store and is left alone. Content
    /// that is not a JSON object is replaced with `{}`.
    pub fn load(&self) -> Result<Map<String, Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(PacketError::io(&self.path)(e)),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "corrupt store, resetting to {{}}");
                let empty = Map::new();
                self.save(&empty)?;
                Ok(empty)
            }
        }
    }

    /// Replace the store contents
    pub fn save(&self, data: &Map<String, Value>) -> Result<()> {
        write_json_atomic(&self.path, &Value::Object(data.clone()))
    }

    /// One record, if present
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    /// Insert or replace one record
    pub fn put(&self, key: &str, record: Value) -> Result<()> {
        let mut data = self.load()?;
        data.insert(key.to_string(), record);
        self.save(&data)
    }
}

/// Write pretty JSON to `path` via a temp file and rename
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(PacketError::io(&dir))?;

    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(PacketError::io(&dir))?;
    file.write_all(&body).map_err(PacketError::io(file.path()))?;
    file.as_file().sync_all().map_err(PacketError::io(file.path()))?;
    file.persist(path).map_err(|e| PacketError::io(path)(e.error))?;
    Ok(())
}

/// The persisted datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreName {
    Projects,
    Companies,
    Jobs,
    Owners,
    Roofs,
    FormsCatalog,
}

impl StoreName {
    pub const ALL: [StoreName; 6] = [
        StoreName::Projects,
        StoreName::Companies,
        StoreName::Jobs,
        StoreName::Owners,
        StoreName::Roofs,
        StoreName::FormsCatalog,
    ];

    /// File stem under the data directory
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreName::Projects => "projects",
            StoreName::Companies => "companies",
            StoreName::Jobs => "jobs",
            StoreName::Owners => "owners",
            StoreName::Roofs => "roofs",
            StoreName::FormsCatalog => "forms_catalog",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreName {
    type Err = PacketError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "catalog" | "forms_catalog" => Ok(StoreName::FormsCatalog),
            other => StoreName::ALL
                .into_iter()
                .find(|store| store.as_str() == other)
                .ok_or_else(|| {
                    PacketError::InvalidInput(format!(
                        "unknown data set '{name}' (expected one of: projects, companies, \
                         jobs, owners, roofs, forms_catalog, catalog)"
                    ))
                }),
        }
    }
}

/// All stores under one data directory
#[derive(Debug, Clone)]
pub struct Stores {
    data_dir: PathBuf,
}

impl Stores {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn store(&self, name: StoreName) -> JsonStore {
        JsonStore::new(self.data_dir.join(format!("{name}.json")))
    }

    /// Load a dataset by name (`catalog` is accepted for `forms_catalog`)
    pub fn load_data(&self, name: &str) -> Result<Map<String, Value>> {
        self.store(name.parse()?).load()
    }

    /// One record as an object; absent or non-object records are `None`
    pub fn record(&self, name: StoreName, key: &str) -> Result<Option<Map<String, Value>>> {
        Ok(match self.store(name).get(key)? {
            Some(Value::Object(record)) => Some(record),
            _ => None,
        })
    }
}
