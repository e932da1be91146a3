use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The role of a message author in a conversation.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// A message authored by the human user.
    User,
    /// A message authored by the service.
    Assistant,
}

/// Metadata attached to an assistant message once its exchange settles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    /// Server-reported processing time in milliseconds, or the
    /// client-measured elapsed time when the server did not report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,

    /// Total tokens consumed by the exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,

    /// Whether `total_tokens` is a client-side estimate rather than an exact
    /// provider-reported count. Streaming exchanges only ever carry an
    /// estimate.
    #[serde(default)]
    pub tokens_estimated: bool,

    /// Source attributions for the response, when the service returned them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// A single message in the conversation, as exposed to the view layer.
///
/// Messages hydrated from server history carry deterministic ids derived from
/// the record id; messages created optimistically at send time carry random
/// ids until a later hydration replaces them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Opaque message id.
    pub id: String,

    /// Who authored the message.
    pub role: MessageRole,

    /// Message text. Mutable for an assistant message while its stream is
    /// still open.
    pub text: String,

    /// Creation time of the message.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,

    /// Exchange metadata, present once the exchange has settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Creates a new user message with a random id, stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            text: text.into(),
            created_at: OffsetDateTime::now_utc(),
            metadata: None,
        }
    }

    /// Creates an empty assistant placeholder with a random id, stamped now.
    ///
    /// The placeholder's text is appended to in place as streamed frames
    /// arrive, or replaced wholesale by a non-streaming response.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            text: String::new(),
            created_at: OffsetDateTime::now_utc(),
            metadata: None,
        }
    }

    /// Returns true if this is an assistant message.
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}
