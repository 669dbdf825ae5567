//! Device-local storage for the API key.
//!
//! The store is a plain key-value contract. [`MemoryCredentialStore`] keeps
//! values for the life of the process; [`FileCredentialStore`] keeps them in
//! a JSON file under the user's config directory.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::observability::{CREDENTIAL_REMOVALS, CREDENTIAL_WRITES};

/// The identifier the API key is stored under.
pub const API_KEY_CREDENTIAL: &str = "gemini_api_key";

/// A persistent, device-local key-value store.
pub trait CredentialStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// An in-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `value` under `key`.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().insert(key.into(), value.into());
        store
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        CREDENTIAL_WRITES.click();
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        CREDENTIAL_REMOVALS.click();
        self.lock().remove(key);
        Ok(())
    }
}

/// A credential store backed by a JSON object on disk.
///
/// Every call re-reads the file so that two sessions on the same device see
/// each other's writes.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileCredentialStore {
    /// Creates a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// The default location, `<config dir>/bestbro/credentials.json`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::configuration("could not determine config directory"))?;
        Ok(config_dir.join("bestbro").join("credentials.json"))
    }

    /// Creates a store at [`FileCredentialStore::default_path`].
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(Error::io("failed to open credential file", err)),
        };
        from_reader(BufReader::new(file)).map_err(|err| {
            Error::serialization("failed to parse credential file", Some(Box::new(err)))
        })
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create credential directory", err))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let file = create_private(&tmp)
            .map_err(|err| Error::io("failed to create credential file", err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, values).map_err(|err| {
            Error::serialization("failed to serialize credentials", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io("failed to write credential file", err))?;
        fs::rename(&tmp, &self.path)
            .map_err(|err| Error::io("failed to replace credential file", err))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.guard.lock().unwrap_or_else(|poison| poison.into_inner());
        let mut values = self.read()?;
        f(&mut values);
        self.write(&values)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard.lock().unwrap_or_else(|poison| poison.into_inner());
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        CREDENTIAL_WRITES.click();
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        CREDENTIAL_REMOVALS.click();
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<File> {
    File::create(path)
}
