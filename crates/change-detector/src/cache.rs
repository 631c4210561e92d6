use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::CacheError;

/// Persisted `{ "files": { <path>: <digest> } }` map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCache {
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl ChangeCache {
    /// A missing or unreadable cache loads as empty, so every scenario
    /// counts as changed.
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no change cache yet");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "change cache unreadable; starting empty");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(cache) => cache,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "change cache corrupt; starting empty");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &data)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.files.get(key).map(String::as_str)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CacheError::io(parent, source))?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .map_err(|source| CacheError::io(&tmp, source))?;
    file.write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|source| CacheError::io(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| CacheError::io(path, source))
}
