//! Durable storage for the bearer token.
//!
//! The token store is deliberately infallible at its interface: storage
//! problems degrade to the unauthenticated state instead of surfacing as
//! errors, so a broken disk never takes the client down with it.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Persists and retrieves the bearer token.
///
/// Implementations must never panic or propagate storage failures: on any
/// underlying failure, `get` returns `None` and `set` is a no-op.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, or `None` when absent or unreadable.
    fn get(&self) -> Option<String>;

    /// Stores the token, or clears it when `None`. Failures are swallowed.
    fn set(&self, token: Option<&str>);
}

/// A token store backed by a single file.
///
/// The token survives process restarts. `set(None)` removes the file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store persisting to the given path. The parent directory is
    /// created lazily on the first `set`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path this store persists to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn set(&self, token: Option<&str>) {
        match token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(&self.path, token);
            }
            None => {
                let _ = fs::remove_file(&self.path);
            }
        }
    }
}

/// An in-process token store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().ok()?.clone()
    }

    fn set(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = token.map(String::from);
        }
    }
}
