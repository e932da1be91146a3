use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

static PROCESS_SESSION_ID: OnceLock<SessionId> = OnceLock::new();

/// A client-chosen opaque identifier scoping a sequence of exchanges for
/// history lookup.
///
/// A session id is never mutated and never cleared automatically. The
/// process-scoped id is generated on first use and reused verbatim for the
/// lifetime of the process; distinct processes get distinct ids and do not
/// coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh opaque session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the process-scoped session id, generating it on first use.
    pub fn process_scoped() -> Self {
        PROCESS_SESSION_ID.get_or_init(Self::generate).clone()
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
