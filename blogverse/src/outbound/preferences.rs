//! Preference storage adapters.
//!
//! [`FilePreferenceStorage`] keeps a flat JSON object of string values in a
//! single file, accessed through `cap_std`. [`InMemoryPreferenceStorage`]
//! serves tests and ephemeral sessions.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::ports::{PreferenceStorage, PreferenceStorageError};

/// Preferences persisted as a JSON object in one file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStorage {
    path: PathBuf,
}

fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "preference path must include a file name",
        )
    })?;
    Ok((parent, file_name.to_os_string()))
}

fn io_error(path: &Path, error: &io::Error) -> PreferenceStorageError {
    PreferenceStorageError::io(format!("{}: {error}", path.display()))
}

impl FilePreferenceStorage {
    /// Use the file at `path`; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_parent(&self) -> Result<(Dir, OsString), PreferenceStorageError> {
        let (parent, file_name) =
            parent_and_file_name(&self.path).map_err(|err| io_error(&self.path, &err))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| io_error(&self.path, &err))?;
        Ok((dir, file_name))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceStorageError> {
        let (dir, file_name) = self.open_parent()?;
        let contents = match dir.read_to_string(Path::new(&file_name)) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|err| {
            PreferenceStorageError::corrupt(format!("{}: {err}", self.path.display()))
        })
    }
}

impl PreferenceStorage for FilePreferenceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceStorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceStorageError> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        let payload = serde_json::to_vec_pretty(&values)
            .map_err(|err| PreferenceStorageError::corrupt(err.to_string()))?;
        let (dir, file_name) = self.open_parent()?;
        dir.write(Path::new(&file_name), payload)
            .map_err(|err| io_error(&self.path, &err))
    }
}

/// Preferences kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStorage {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStorage for InMemoryPreferenceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceStorageError> {
        let values = self
            .values
            .lock()
            .map_err(|_| PreferenceStorageError::io("preference lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceStorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PreferenceStorageError::io("preference lock poisoned"))?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! File-backed and in-memory preference storage.
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn temp_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    #[rstest]
    fn missing_file_reads_as_empty() {
        let dir = temp_dir();
        let storage = FilePreferenceStorage::new(dir.path().join("prefs.json"));
        assert_eq!(storage.get("theme").expect("read"), None);
    }

    #[rstest]
    fn values_survive_a_new_handle() {
        let dir = temp_dir();
        let path = dir.path().join("prefs.json");
        FilePreferenceStorage::new(&path)
            .set("theme", "dark")
            .expect("write");
        FilePreferenceStorage::new(&path)
            .set("other", "x")
            .expect("write");

        let reopened = FilePreferenceStorage::new(&path);
        assert_eq!(reopened.get("theme").expect("read").as_deref(), Some("dark"));
        assert_eq!(reopened.get("other").expect("read").as_deref(), Some("x"));
    }

    #[rstest]
    fn corrupt_file_is_reported() {
        let dir = temp_dir();
        let path = dir.path().join("prefs.json");
        let handle = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("dir");
        handle.write("prefs.json", b"{not json").expect("write");

        let err = FilePreferenceStorage::new(&path)
            .get("theme")
            .expect_err("corrupt");
        assert!(matches!(err, PreferenceStorageError::Corrupt { .. }));
    }

    #[rstest]
    fn missing_directory_is_an_io_error() {
        let dir = temp_dir();
        let storage = FilePreferenceStorage::new(dir.path().join("absent").join("prefs.json"));
        let err = storage.set("theme", "dark").expect_err("no parent");
        assert!(matches!(err, PreferenceStorageError::Io { .. }));
    }

    #[rstest]
    fn in_memory_round_trip() {
        let storage = InMemoryPreferenceStorage::default();
        assert_eq!(storage.get("theme").expect("read"), None);
        storage.set("theme", "dark").expect("write");
        assert_eq!(storage.get("theme").expect("read").as_deref(), Some("dark"));
    }
}
