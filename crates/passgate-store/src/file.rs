//! File-backed key-value storage.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use passgate_core::Result;
use passgate_core::error::{Error, StorageError};
use passgate_core::KeyValueStorage;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const STORAGE_FILE: &str = "storage.json";
const LOCK_FILE: &str = "storage.lock";

fn map_io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| {
        Error::Storage(StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

/// Key-value storage kept in one JSON object file.
///
/// Every write takes an exclusive lock on a sibling lock file, re-reads the
/// current contents, applies the change and atomically replaces the file, so
/// writes from several processes never lose each other's keys and a batch
/// written with `set_many` lands all at once. A storage file that cannot be
/// parsed reads as empty.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory holding the storage file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the storage file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(map_io(&path)(err)),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable storage file");
                Ok(BTreeMap::new())
            }
        }
    }

    #[instrument(skip(self, change), fields(dir = %self.dir.display()))]
    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        fs::create_dir_all(&self.dir).map_err(map_io(&self.dir))?;

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        lock_file.lock_exclusive().map_err(|e| {
            Error::Storage(StorageError::Lock {
                message: e.to_string(),
            })
        })?;

        let result = self.write_locked(change);

        FileExt::unlock(&lock_file).map_err(map_io(&lock_path))?;

        result
    }

    fn write_locked<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.read_entries()?;
        change(&mut entries);

        let content = serde_json::to_string_pretty(&entries).map_err(|e| {
            Error::Storage(StorageError::Serialization {
                message: e.to_string(),
            })
        })?;

        let path = self.path();
        let temp_path = self.dir.join(format!(".{}.{}.tmp", STORAGE_FILE, Uuid::new_v4()));
        fs::write(&temp_path, &content).map_err(map_io(&temp_path))?;

        // Restrict before the file becomes visible under its real name
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)
                .map_err(map_io(&temp_path))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(map_io(&temp_path))?;
        }

        if let Err(err) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(map_io(&path)(err));
        }

        debug!(keys = entries.len(), "Storage file written");
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        if !self.path().exists() {
            return Ok(());
        }
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
