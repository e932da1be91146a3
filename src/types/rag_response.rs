use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A retrieved context chunk attached to a non-streaming response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextChunk {
    /// Opaque chunk id.
    pub chunk_id: String,

    /// Id of the document the chunk was cut from.
    pub document_id: String,

    /// Similarity score against the query.
    pub score: f32,

    /// The chunk text.
    pub text: String,

    /// Human-readable source name (usually a filename).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Page number within the source document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// Index of this chunk within the source document.
    #[serde(default)]
    pub chunk_index: u32,
}

/// Full JSON result from `POST /queries/rag`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagResponse {
    /// Server-assigned id for the persisted query record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,

    /// The query text, echoed back.
    pub query: String,

    /// The generated response text.
    pub response: String,

    /// Context chunks used for generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_documents: Vec<ContextChunk>,

    /// Server-side processing time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,

    /// Prompt tokens consumed.
    #[serde(default)]
    pub input_tokens: u32,

    /// Completion tokens consumed.
    #[serde(default)]
    pub output_tokens: u32,

    /// Total tokens consumed, exact as reported by the provider.
    #[serde(default)]
    pub total_tokens: u32,

    /// Distinct source names attributed to the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_attribution: Vec<String>,

    /// Session id the exchange was recorded under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Server-side creation time of the query record.
    #[serde(
        default,
        with = "crate::utils::time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}
