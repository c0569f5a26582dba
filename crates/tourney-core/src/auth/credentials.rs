use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SERVICE_NAME: &str = "tourney";

/// Keychain account holding the serialized credential pair
const KEYRING_ACCOUNT: &str = "session";

/// Credential file name in the data directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Access and refresh tokens, always stored and cleared together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Durable holder for the credential pair.
///
/// Storage is best-effort: backends log their failures and carry on.
/// Absence of credentials is a normal state, not an error.
pub trait CredentialStore: Send + Sync {
    fn save(&self, pair: &CredentialPair);

    fn load(&self) -> Option<CredentialPair>;

    fn clear(&self);

    fn access_token(&self) -> Option<String> {
        self.load().map(|pair| pair.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().map(|pair| pair.refresh_token)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// OS keychain
// ============================================================================

/// Stores the pair as one JSON secret in the OS keychain.
/// Reads are served from memory after the first keychain lookup.
pub struct KeyringStore {
    account: String,
    cached: Mutex<Option<Option<CredentialPair>>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_account(KEYRING_ACCOUNT)
    }

    pub fn with_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            cached: Mutex::new(None),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    fn read(&self) -> Result<Option<CredentialPair>> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                let pair = serde_json::from_str(&secret)
                    .context("Failed to parse credentials from keychain")?;
                Ok(Some(pair))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credentials from keychain"),
        }
    }

    fn write(&self, pair: &CredentialPair) -> Result<()> {
        let secret = serde_json::to_string(pair)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store credentials in keychain")
    }

    fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credentials from keychain"),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn save(&self, pair: &CredentialPair) {
        if let Err(e) = self.write(pair) {
            warn!(error = %e, "Failed to persist credentials");
        }
        *lock(&self.cached) = Some(Some(pair.clone()));
    }

    fn load(&self) -> Option<CredentialPair> {
        let mut cached = lock(&self.cached);
        if let Some(pair) = cached.as_ref() {
            return pair.clone();
        }
        let pair = self.read().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load credentials");
            None
        });
        *cached = Some(pair.clone());
        pair
    }

    fn clear(&self) {
        if let Err(e) = self.delete() {
            warn!(error = %e, "Failed to clear credentials");
        }
        *lock(&self.cached) = Some(None);
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// Stores the pair as a JSON file, for hosts without a usable keychain.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIALS_FILE),
        }
    }

    /// Store in the per-user data directory (`~/.local/share/tourney` on Linux)
    pub fn in_data_dir() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(Self::new(data_dir.join(SERVICE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<CredentialPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read credentials file")?;
        let pair = serde_json::from_str(&contents).context("Failed to parse credentials file")?;
        Ok(Some(pair))
    }

    fn write(&self, pair: &CredentialPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Replace atomically; readers never see half a pair
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(pair)?)
            .context("Failed to write credentials file")?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace credentials file")?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove credentials file")?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl CredentialStore for FileStore {
    fn save(&self, pair: &CredentialPair) {
        if let Err(e) = self.write(pair) {
            warn!(error = %e, path = %self.path.display(), "Failed to persist credentials");
        }
    }

    fn load(&self) -> Option<CredentialPair> {
        self.read().unwrap_or_else(|e| {
            warn!(error = %e, path = %self.path.display(), "Failed to load credentials");
            None
        })
    }

    fn clear(&self) {
        if let Err(e) = self.delete() {
            warn!(error = %e, path = %self.path.display(), "Failed to clear credentials");
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn save(&self, pair: &CredentialPair) {
        debug!("Storing credentials in memory");
        *lock(&self.pair) = Some(pair.clone());
    }

    fn load(&self) -> Option<CredentialPair> {
        lock(&self.pair).clone()
    }

    fn clear(&self) {
        *lock(&self.pair) = None;
    }
}
