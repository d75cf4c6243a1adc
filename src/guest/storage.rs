//! Key-value storage ports used by the guest subsystem.
//!
//! A browser exposes a few independent places to stash small strings
//! (persistent storage, per-tab session storage and cookies). Each of
//! those is modeled as a `StoragePort` so the quota tracker can be
//! driven by in-memory maps in tests and by files from the CLI.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Error, Result, anyhow};

pub const COUNT_KEY: &str = "guestMsgCount";
pub const APP_STATE_KEY: &str = "_app_state";
pub const RECENT_ACTIVITY_KEY: &str = "_recent_activity";
pub const COOKIE_KEY: &str = "gmc";

pub trait StoragePort {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

pub type BoxedStoragePort = Box<dyn StoragePort + Send + Sync + 'static>;

/// In-memory storage. Clones share the same underlying map which is
/// how two tabs of the same browser profile see each other's writes.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that fails every call, like a browser with storage
    /// disabled or a locked profile.
    pub fn unavailable() -> Self {
        Self {
            entries: Arc::default(),
            unavailable: true,
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, Error> {
        if self.unavailable {
            return Err(anyhow!("Storage is unavailable"));
        }
        self.entries
            .lock()
            .map_err(|_| anyhow!("Storage lock poisoned"))
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, Error> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl StoragePort for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// The redundant locations a guest's state is written to.
pub struct GuestStores {
    /// Survives restarts and is shared by every tab
    pub local: BoxedStoragePort,
    /// Scoped to a single tab
    pub session: BoxedStoragePort,
    /// Short-lived cookie shared by every tab
    pub cookie: BoxedStoragePort,
}

impl GuestStores {
    pub fn new(
        local: impl StoragePort + Send + Sync + 'static,
        session: impl StoragePort + Send + Sync + 'static,
        cookie: impl StoragePort + Send + Sync + 'static,
    ) -> Self {
        Self {
            local: Box::new(local),
            session: Box::new(session),
            cookie: Box::new(cookie),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new(), MemoryStorage::new(), MemoryStorage::new())
    }

    /// File backed stores rooted at `dir`, used by the CLI guest session.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            FileStorage::new(dir.join("local.json")),
            FileStorage::new(dir.join("session.json")),
            FileStorage::new(dir.join("cookies.json")),
        )
    }
}
