use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{info, warn};

/// Key under which the credential is persisted in the local store file.
pub const CREDENTIAL_STORE_KEY: &str = "gemini_api_key";

/// Opaque provider credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Last four characters, for status output.
    pub fn hint(&self) -> String {
        let chars = self.0.chars().collect::<Vec<_>>();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[redacted]").finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    LocalStore,
}

impl CredentialSource {
    pub fn label(self) -> &'static str {
        match self {
            CredentialSource::Environment => "environment",
            CredentialSource::LocalStore => "local_store",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// Small JSON key/value file standing in for browser local storage.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let body = fs::read_to_string(&self.path).map_err(|err| {
            anyhow!("Failed to read local store '{}': {}", self.path.display(), err)
        })?;
        if body.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&body).map_err(|err| {
            anyhow!("Failed to parse local store '{}': {}", self.path.display(), err)
        })
    }

    fn save_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, body).map_err(|err| {
            anyhow!("Failed to write local store '{}': {}", self.path.display(), err)
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_entries()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.save_entries(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.load_entries()?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.save_entries(&entries)?;
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    local: LocalStore,
}

impl CredentialStore {
    pub fn new(local: LocalStore) -> Self {
        Self { local }
    }

    pub fn persisted(&self) -> Option<Credential> {
        match self.local.get(CREDENTIAL_STORE_KEY) {
            Ok(value) => value.and_then(Credential::new),
            Err(err) => {
                warn!("Ignoring unreadable credential store: {}", err);
                None
            }
        }
    }

    pub fn save(&self, value: &str) -> Result<Credential> {
        let credential =
            Credential::new(value).ok_or_else(|| anyhow!("Refusing to store an empty API key"))?;
        self.local.set(CREDENTIAL_STORE_KEY, credential.expose())?;
        info!("Stored API key in {}", self.local.path().display());
        Ok(credential)
    }

    pub fn clear(&self) -> Result<bool> {
        self.local.remove(CREDENTIAL_STORE_KEY)
    }

    /// Environment value first, then the persisted value, else absent.
    pub fn resolve(&self, env_value: Option<&str>) -> Option<ResolvedCredential> {
        if let Some(credential) = env_value.and_then(Credential::new) {
            return Some(ResolvedCredential {
                credential,
                source: CredentialSource::Environment,
            });
        }
        self.persisted().map(|credential| ResolvedCredential {
            credential,
            source: CredentialSource::LocalStore,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_store(label: &str) -> CredentialStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "promptverse-cred-{label}-{}-{nanos}.json",
            std::process::id()
        ));
        CredentialStore::new(LocalStore::new(path))
    }

    #[test]
    fn environment_wins_over_persisted_value() {
        let store = scratch_store("env");
        store.save("stored-key").expect("save");

        let resolved = store.resolve(Some(" env-key ")).expect("resolved");
        assert_eq!(resolved.source, CredentialSource::Environment);
        assert_eq!(resolved.credential.expose(), "env-key");

        let _ = fs::remove_file(store.local.path());
    }

    #[test]
    fn falls_back_to_persisted_then_absent() {
        let store = scratch_store("fallback");
        assert!(store.resolve(Some("   ")).is_none());

        store.save("stored-key").expect("save");
        let resolved = store.resolve(None).expect("resolved");
        assert_eq!(resolved.source, CredentialSource::LocalStore);
        assert_eq!(resolved.credential.expose(), "stored-key");

        assert!(store.clear().expect("clear"));
        assert!(!store.clear().expect("second clear"));
        assert!(store.resolve(None).is_none());

        let _ = fs::remove_file(store.local.path());
    }

    #[test]
    fn corrupt_store_fails_closed() {
        let store = scratch_store("corrupt");
        fs::write(store.local.path(), "{not json").expect("write");
        assert!(store.resolve(None).is_none());
        let _ = fs::remove_file(store.local.path());
    }

    #[test]
    fn rejects_blank_and_never_debug_prints_the_secret() {
        let store = scratch_store("blank");
        assert!(store.save("  ").is_err());

        let credential = Credential::new("AIzaSecretValue").expect("credential");
        assert!(!format!("{credential:?}").contains("Secret"));
        assert_eq!(credential.hint(), "****alue");
        assert_eq!(Credential::new("abc").expect("short").hint(), "****");
    }

    #[test]
    fn keeps_unrelated_entries() {
        let store = scratch_store("entries");
        store.local.set("theme", "pro-dark").expect("set theme");
        store.save("k").expect("save");
        store.clear().expect("clear");
        assert_eq!(
            store.local.get("theme").expect("get").as_deref(),
            Some("pro-dark")
        );
        let _ = fs::remove_file(store.local.path());
    }
}
