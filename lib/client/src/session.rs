use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use openlms_core::User;

/// The persisted session record: access token and user snapshot.
///
/// The two travel as one value everywhere; storage can never hold a
/// token without its user or vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file corrupt: {0}")]
    Corrupt(String),
}

/// On-disk session storage with a write-through in-memory copy.
///
/// This is the only component that touches the session file. The token
/// manager writes it on refresh, the auth layer on login/logout;
/// everyone else reads snapshots.
///
/// Cheap to clone; all clones share the same record.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Load the session from `path`.
    ///
    /// A missing file is an empty (anonymous) store. A file that exists
    /// but doesn't parse is reported as [`SessionError::Corrupt`] so the
    /// caller can decide to discard it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(text) => {
                let session: Session = serde_json::from_str(&text)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                tracing::debug!(user = %session.user.email, "restored persisted session");
                Some(session)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(SessionError::Io(e)),
        };
        Ok(Self {
            inner: Arc::new(Inner {
                path,
                current: RwLock::new(current),
            }),
        })
    }

    /// Create an empty store at `path` without reading the file.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                current: RwLock::new(None),
            }),
        }
    }

    /// Replace the session, writing through to disk.
    pub fn put(&self, session: Session) -> Result<(), SessionError> {
        let text = serde_json::to_string_pretty(&session)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.inner.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.inner.path, text)?;
        *self.inner.current.write().unwrap() = Some(session);
        Ok(())
    }

    /// Drop the session and delete the file. Idempotent: clearing an
    /// already-empty store is a no-op.
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.inner.current.write().unwrap() = None;
        match std::fs::remove_file(&self.inner.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Io(e)),
        }
    }

    /// Current session, if any.
    pub fn snapshot(&self) -> Option<Session> {
        self.inner.current.read().unwrap().clone()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}
