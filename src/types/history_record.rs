use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The persisted response half of a history record.
///
/// Present only once the exchange completed; a record that is still
/// processing, or that failed, has no response payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedResponse {
    /// The generated response text.
    pub response_text: String,

    /// Ids of the context chunks used for generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_chunks: Vec<String>,

    /// Source names attributed to the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_attribution: Vec<String>,

    /// Generation time of the response.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
}

/// One server-persisted query record, read-only to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// Server-assigned record id.
    pub id: String,

    /// The query text as submitted.
    pub query_text: String,

    /// Creation time of the record.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,

    /// Server-side processing time in milliseconds, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,

    /// Total tokens for the exchange, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,

    /// Record status as reported by the service (completed, processing,
    /// failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// The persisted response, when the exchange completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<RecordedResponse>,
}

/// Response body from `GET /queries/history`, newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPage {
    /// The records in this page, newest-first.
    #[serde(default)]
    pub queries: Vec<HistoryRecord>,

    /// Total records matching the filter, across all pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_without_response() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "id": "q1",
            "query_text": "pending question",
            "created_at": "2024-05-01T12:30:00Z",
            "status": "processing"
        }))
        .unwrap();
        assert!(record.response.is_none());
        assert!(record.processing_time_ms.is_none());
    }

    #[test]
    fn record_with_response() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "id": "q2",
            "query_text": "answered question",
            "created_at": "2024-05-01T12:30:00Z",
            "processing_time_ms": 850.0,
            "total_tokens": 120,
            "status": "completed",
            "response": {
                "response_text": "the answer",
                "context_chunks": ["c1", "c2"],
                "source_attribution": ["notes.md"],
                "created_at": "2024-05-01T12:30:01Z"
            }
        }))
        .unwrap();
        let response = record.response.unwrap();
        assert_eq!(response.response_text, "the answer");
        assert_eq!(response.context_chunks.len(), 2);
    }

    #[test]
    fn empty_page() {
        let page: HistoryPage = serde_json::from_value(json!({"queries": []})).unwrap();
        assert!(page.queries.is_empty());
        assert!(page.total.is_none());
    }
}
