//! Client-side session cache.
//!
//! Holds the public user and bearer token returned by signup/login. When
//! backed by a file the session survives restarts; an expired session is
//! treated as absent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use closet_shared::protocol::AuthResponse;
use closet_shared::types::PublicUser;

use crate::error::{ClientError, Result};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSession {
    pub user: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<AuthResponse> for CachedSession {
    fn from(resp: AuthResponse) -> Self {
        Self {
            user: resp.user,
            token: resp.token,
            expires_at: resp.expires_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionCache {
    path: Option<PathBuf>,
    session: Option<CachedSession>,
}

impl SessionCache {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `<platform data dir>/session.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "closet", "closet")
            .ok_or(ClientError::NoDataDir)?;
        Ok(dirs.data_dir().join(SESSION_FILE))
    }

    /// Load the cache persisted at the platform default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Load the cache persisted at `path`. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        let session = match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<CachedSession>(&bytes) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable session cache");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), present = session.is_some(), "Session cache loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            session,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn store(&mut self, session: CachedSession) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_vec_pretty(&session)?)?;
        }
        self.session = Some(session);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.session = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// The cached session, unless it has expired.
    pub fn current(&self) -> Option<&CachedSession> {
        self.session
            .as_ref()
            .filter(|s| !s.is_expired_at(Utc::now()))
    }
}
