use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::cache::ChangeCache;
use crate::errors::CacheError;
use crate::hash::hash_file;

/// Every change is reported against the whole file.
pub const WHOLE_FILE: &str = "*";
pub const CONTENT_CHANGE: &str = "content";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScenarioChange {
    pub file: PathBuf,
    pub test_case: String,
    pub changes: Vec<String>,
    pub hash: String,
}

impl ScenarioChange {
    fn content(file: PathBuf, hash: String) -> Self {
        Self {
            file,
            test_case: WHOLE_FILE.to_string(),
            changes: vec![CONTENT_CHANGE.to_string()],
            hash,
        }
    }
}

/// `*.txt` files directly under `dir`, sorted. A missing directory has none.
pub fn list_scenario_files(dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| CacheError::io(dir, source))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CacheError::io(dir, source))?;
        let path = entry.path();
        let is_scenario = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if is_scenario && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct ChangeDetector {
    scenario_dir: PathBuf,
    cache_path: PathBuf,
    cache: ChangeCache,
}

impl ChangeDetector {
    pub fn new(scenario_dir: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let cache = ChangeCache::load(&cache_path);
        Self {
            scenario_dir: scenario_dir.into(),
            cache_path,
            cache,
        }
    }

    pub fn scenario_dir(&self) -> &Path {
        &self.scenario_dir
    }

    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }

    pub fn scenario_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        list_scenario_files(&self.scenario_dir)
    }

    /// Scenario files whose content differs from the last recorded run.
    pub fn get_changed_tests(&self) -> Result<Vec<ScenarioChange>, CacheError> {
        let mut changed = Vec::new();
        for file in self.scenario_files()? {
            let hash = hash_file(&file)?;
            let key = cache_key(&file);
            if self.cache.get(&key) != Some(hash.as_str()) {
                debug!(file = %file.display(), "scenario changed");
                changed.push(ScenarioChange::content(file, hash));
            }
        }
        debug!(changed = changed.len(), dir = %self.scenario_dir.display(), "change scan complete");
        Ok(changed)
    }

    /// Records the current digest of `files` and flushes the cache. Files
    /// that no longer exist are forgotten.
    pub fn mark_run(&mut self, files: &[PathBuf]) -> Result<(), CacheError> {
        for file in files {
            let key = cache_key(file);
            if file.exists() {
                let hash = hash_file(file)?;
                self.cache.files.insert(key, hash);
            } else {
                self.cache.files.remove(&key);
            }
        }
        self.cache.save(&self.cache_path)?;
        debug!(files = files.len(), cache = %self.cache_path.display(), "marked run");
        Ok(())
    }
}

/// Cache key for `file`: its absolute, symlink-resolved path. A file that
/// no longer exists resolves through its parent directory, so `mark_run`
/// can still drop its entry.
pub fn cache_key(file: &Path) -> String {
    let resolved = fs::canonicalize(file)
        .or_else(|_| {
            let name = file
                .file_name()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            let parent = file
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            fs::canonicalize(parent).map(|dir| dir.join(name))
        })
        .or_else(|_| path::absolute(file))
        .unwrap_or_else(|_| file.to_path_buf());
    resolved.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_absolute_and_normalised() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(tmp.path().join("a")).expect("mkdir");
        let file = tmp.path().join("login.txt");
        fs::write(&file, "## x\n").expect("write");

        let canonical = fs::canonicalize(&file).expect("canonical");
        let key = cache_key(&file);
        assert!(Path::new(&key).is_absolute(), "{key}");
        assert_eq!(key, canonical.to_string_lossy());
        assert_eq!(cache_key(&tmp.path().join("a/../login.txt")), key);

        fs::remove_file(&file).expect("remove");
        assert_eq!(cache_key(&file), key);
    }

    #[test]
    fn discovers_txt_files_case_insensitively() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for name in ["b.txt", "A.TXT", "notes.md"] {
            fs::write(tmp.path().join(name), "## x\n").expect("write");
        }
        fs::create_dir(tmp.path().join("dir.txt")).expect("mkdir");
        let files = list_scenario_files(tmp.path()).expect("list");
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.TXT", "b.txt"]);
    }

    #[test]
    fn missing_dir_has_no_scenarios() {
        let files = list_scenario_files(Path::new("/definitely/not/here")).expect("list");
        assert!(files.is_empty());
    }
}
