//! API key sources and caching.
//!
//! A key is either supplied statically or pulled from a [`SecretStore`] and
//! cached for a TTL. Store-backed keys can be force-refreshed, which the
//! fetcher does once when the API rejects a key with 403.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Errors that can occur while reading a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret {0} is not set")]
    Missing(String),

    #[error("Secret {0} is empty")]
    Empty(String),

    #[error("Failed to read secret file: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can hand out a credential by id.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the current value.
    async fn get_credential(&self, id: &str) -> Result<String, SecretError>;

    /// Fetch the value, bypassing any store-side caching.
    async fn force_refresh(&self, id: &str) -> Result<String, SecretError>;
}

/// Reads the secret from an environment variable named by the id.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn get_credential(&self, id: &str) -> Result<String, SecretError> {
        let value = std::env::var(id).map_err(|_| SecretError::Missing(id.to_string()))?;
        non_empty(id, value)
    }

    async fn force_refresh(&self, id: &str) -> Result<String, SecretError> {
        self.get_credential(id).await
    }
}

/// Reads the secret from a file: either `{"api_key": "..."}` or the bare key.
///
/// The id is resolved relative to `root` when given.
#[derive(Debug, Default, Clone)]
pub struct FileSecretStore {
    root: Option<PathBuf>,
}

#[derive(Deserialize)]
struct SecretDocument {
    api_key: Option<String>,
}

impl FileSecretStore {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root: Some(root) }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(id),
            None => PathBuf::from(id),
        }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get_credential(&self, id: &str) -> Result<String, SecretError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(SecretError::Missing(path.display().to_string()));
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let value = match serde_json::from_str::<SecretDocument>(&contents) {
            Ok(doc) => doc.api_key.unwrap_or_default(),
            Err(_) => contents,
        };
        non_empty(id, value)
    }

    async fn force_refresh(&self, id: &str) -> Result<String, SecretError> {
        self.get_credential(id).await
    }
}

fn non_empty(id: &str, value: String) -> Result<String, SecretError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(SecretError::Empty(id.to_string()))
    } else {
        Ok(value)
    }
}

/// Where the API key comes from.
#[derive(Clone)]
pub enum CredentialSource {
    /// Fixed key, never refreshed
    Static(String),

    /// Key held in a secret store
    Store {
        store: Arc<dyn SecretStore>,
        secret_id: String,
    },
}

struct CachedCredential {
    value: String,
    fetched_at: Instant,
}

/// Hands out the API key, caching store-backed keys for `ttl`.
pub struct CredentialProvider {
    source: CredentialSource,
    ttl: Duration,
    cache: Mutex<Option<CachedCredential>>,
}

impl CredentialProvider {
    pub fn new(source: CredentialSource, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Provider for a fixed key.
    pub fn fixed(key: impl Into<String>) -> Self {
        Self::new(CredentialSource::Static(key.into()), Duration::ZERO)
    }

    /// Whether a rejected key can be replaced by asking the store again.
    pub fn is_refreshable(&self) -> bool {
        matches!(self.source, CredentialSource::Store { .. })
    }

    /// Current key, from cache when still fresh.
    pub async fn current(&self) -> Result<String, SecretError> {
        let (store, secret_id) = match &self.source {
            CredentialSource::Static(key) => return Ok(key.clone()),
            CredentialSource::Store { store, secret_id } => (store, secret_id),
        };

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.value.clone());
            }
        }

        match store.get_credential(secret_id).await {
            Ok(value) => {
                *cache = Some(CachedCredential {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(value)
            }
            Err(e) => stale_or(cache.as_ref(), e),
        }
    }

    /// Force a fresh read from the store.
    ///
    /// Falls back to the previously cached key if the store fails.
    pub async fn refresh(&self) -> Result<String, SecretError> {
        let (store, secret_id) = match &self.source {
            CredentialSource::Static(key) => return Ok(key.clone()),
            CredentialSource::Store { store, secret_id } => (store, secret_id),
        };

        let mut cache = self.cache.lock().await;
        match store.force_refresh(secret_id).await {
            Ok(value) => {
                info!("API key refreshed from {} store", store.name());
                *cache = Some(CachedCredential {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(value)
            }
            Err(e) => stale_or(cache.as_ref(), e),
        }
    }
}

fn stale_or(cached: Option<&CachedCredential>, err: SecretError) -> Result<String, SecretError> {
    match cached {
        Some(cached) => {
            warn!("Failed to read API key ({}), using cached key", err);
            Ok(cached.value.clone())
        }
        None => Err(err),
    }
}
