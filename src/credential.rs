/// Admin credential and its persistence.
///
/// The credential is an opaque shared secret. It is compared, stored, and
/// sent to the backend, never parsed.
///
/// Persistence is a small string key/value store in the spirit of browser
/// local storage. The file-backed store keeps a flat JSON object at
/// `~/.shopdash/storage.json`; the credential lives under [`CREDENTIAL_KEY`].
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Storage key holding the admin credential.
pub const CREDENTIAL_KEY: &str = "adminKey";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The admin API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key. Returns `None` for the empty string, which never
    /// authenticates.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// String key/value persistence.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// JSON-file-backed store.
///
/// Every call reads or rewrites the whole file; the store is tiny. A missing
/// file reads as empty. A corrupt file also reads as empty and is replaced
/// on the next write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(map).context("failed to serialize storage")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-process store for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The in-memory credential plus the store it mirrors.
///
/// `init` reads the persisted value, `establish` writes it, `teardown`
/// clears both copies.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    credential: Option<Credential>,
}

impl<S: CredentialStore> Session<S> {
    /// Load any persisted credential from `store`.
    pub fn init(store: S) -> Result<Self> {
        let credential = store.get(CREDENTIAL_KEY)?.and_then(Credential::new);
        Ok(Self { store, credential })
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Persist and adopt `credential`.
    pub fn establish(&mut self, credential: Credential) -> Result<()> {
        self.store.set(CREDENTIAL_KEY, credential.as_str())?;
        self.credential = Some(credential);
        Ok(())
    }

    /// Forget the credential. The in-memory copy is dropped even when the
    /// store fails.
    pub fn teardown(&mut self) -> Result<()> {
        self.credential = None;
        self.store.remove(CREDENTIAL_KEY)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
