use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qna_logging::{qna_debug, qna_info};

use crate::{AtomicFileWriter, PersistError};

pub const CREDENTIAL_FILENAME: &str = "credential.json";
pub const MASK_CHAR: char = '•';

/// A stored API key. `Debug` prints only its length.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", qna_logging::redacted(&self.0))
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    Blank,
    #[error("credential file io error: {0}")]
    Io(#[from] io::Error),
    #[error("credential file is malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Persistent home of the single API key.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<ApiKey>, CredentialError>;

    /// Stores the trimmed value; blank values are rejected.
    fn set(&self, value: &str) -> Result<(), CredentialError>;

    /// Removes the stored key. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// One mask character per character of `value`.
pub fn masked_display(value: &str) -> String {
    value.chars().map(|_| MASK_CHAR).collect()
}

/// `$XDG_DATA_HOME/qna-chat`, falling back to `$HOME/.local/share/qna-chat`.
pub fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".local/share"))
                .unwrap_or_else(|_| PathBuf::from("."))
        })
        .join("qna-chat")
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    api_key: String,
}

fn validated(value: &str) -> Result<&str, CredentialError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::Blank);
    }
    Ok(trimmed)
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILENAME)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<ApiKey>, CredentialError> {
        let content = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredCredential = serde_json::from_str(&content)?;
        if stored.api_key.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(ApiKey::new(stored.api_key)))
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        let api_key = validated(value)?.to_owned();
        let content = serde_json::to_string(&StoredCredential { api_key })?;
        let path = AtomicFileWriter::new(self.dir.clone()).write(CREDENTIAL_FILENAME, &content)?;
        qna_info!("Stored API key in {:?}", path);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {
                qna_info!("Removed stored API key");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                qna_debug!("No stored API key to remove");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps the key in memory only; used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<ApiKey>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(ApiKey::new(value))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<ApiKey>, CredentialError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        let api_key = ApiKey::new(validated(value)?);
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(api_key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
