// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed session token store.
//!
//! Holds at most one token per store. The token lives in memory as a
//! [`SecretString`] and on disk as a small JSON document next to the time it
//! was saved. On Unix the file is written with mode `0600`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futureguide_config::model::SessionConfig;
use futureguide_core::FutureGuideError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Owner of the client's single session token.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    token: Option<SecretString>,
}

impl TokenStore {
    /// Create a store bound to `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            token: None,
        }
    }

    /// Create a store and load any token already persisted at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FutureGuideError> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, FutureGuideError> {
        Self::open(&config.token_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The token currently held, if any.
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Re-read the token file. A missing file means no session.
    pub fn load(&mut self) -> Result<Option<&SecretString>, FutureGuideError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.token = None;
                return Ok(None);
            }
            Err(e) => return Err(storage(e)),
        };

        let stored: StoredSession = serde_json::from_str(&raw).map_err(storage)?;
        self.token = (!stored.token.is_empty()).then(|| SecretString::from(stored.token));
        debug!(path = %self.path.display(), present = self.token.is_some(), "loaded session token");
        Ok(self.token.as_ref())
    }

    /// Persist `token`, replacing any previous session.
    pub fn save(&mut self, token: SecretString) -> Result<(), FutureGuideError> {
        if token.expose_secret().is_empty() {
            return Err(FutureGuideError::validation("session token must not be empty"));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage)?;
        }

        let stored = StoredSession {
            token: token.expose_secret().to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(storage)?;

        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, json.as_bytes()).map_err(storage)?;
        fs::rename(&tmp, &self.path).map_err(storage)?;

        self.token = Some(token);
        debug!(path = %self.path.display(), "saved session token");
        Ok(())
    }

    /// Forget the session in memory and on disk.
    pub fn clear(&mut self) -> Result<(), FutureGuideError> {
        self.token = None;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage(e)),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)
}

fn storage(e: impl std::error::Error + Send + Sync + 'static) -> FutureGuideError {
    FutureGuideError::Storage {
        source: Box::new(e),
    }
}
