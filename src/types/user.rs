use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the service.
///
/// Only `id` and `email` are guaranteed by the wire contract; everything else
/// is service-dependent and defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Opaque user id.
    pub id: String,

    /// The user's email address.
    pub email: String,

    /// Display name, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Role assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Preferred model provider configured for this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,

    /// Preferred model configured for this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}
