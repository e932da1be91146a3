//! Reconciliation of server-persisted history into an ordered conversation.
//!
//! The server returns query records newest-first; the view wants messages
//! oldest-first. This transformation is pure and deterministic: identical
//! records always produce the identical message sequence, ids included, so
//! re-hydration is idempotent.

use crate::types::{HistoryRecord, Message, MessageMetadata, MessageRole};

/// Transform server history records into an ordered message sequence.
///
/// Input is newest-first as delivered by the service; output is oldest-first.
/// Each record yields a user message; a record that carries a response
/// payload yields a following assistant message. A record still processing
/// (or failed) yields only its user message.
///
/// Hydrated message ids are derived from the record id plus a role suffix,
/// which keeps them stable across re-fetches and distinct from the random
/// ids of optimistic send-time messages.
pub fn reconcile(records: &[HistoryRecord]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(records.len() * 2);

    for record in records.iter().rev() {
        messages.push(Message {
            id: format!("{}-user", record.id),
            role: MessageRole::User,
            text: record.query_text.clone(),
            created_at: record.created_at,
            metadata: None,
        });

        if let Some(response) = &record.response {
            messages.push(Message {
                id: format!("{}-assistant", record.id),
                role: MessageRole::Assistant,
                text: response.response_text.clone(),
                created_at: response.created_at,
                metadata: Some(MessageMetadata {
                    processing_time_ms: record.processing_time_ms,
                    total_tokens: record.total_tokens,
                    tokens_estimated: false,
                    sources: response.source_attribution.clone(),
                }),
            });
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordedResponse;
    use time::macros::datetime;

    fn record(id: &str, minute: u8, answered: bool) -> HistoryRecord {
        let created_at = datetime!(2024-05-01 12:00:00 UTC) + time::Duration::minutes(minute as i64);
        HistoryRecord {
            id: id.to_string(),
            query_text: format!("question {id}"),
            created_at,
            processing_time_ms: answered.then_some(900.0),
            total_tokens: answered.then_some(80),
            status: Some(if answered { "completed" } else { "processing" }.to_string()),
            response: answered.then(|| RecordedResponse {
                response_text: format!("answer {id}"),
                context_chunks: vec!["c1".to_string()],
                source_attribution: vec!["notes.md".to_string()],
                created_at: created_at + time::Duration::seconds(2),
            }),
        }
    }

    #[test]
    fn empty_history() {
        assert!(reconcile(&[]).is_empty());
    }

    #[test]
    fn counts_and_ordering() {
        // Newest-first input: q3 (answered), q2 (pending), q1 (answered).
        let records = vec![record("q3", 3, true), record("q2", 2, false), record("q1", 1, true)];
        let messages = reconcile(&records);

        // 3 records, 2 with responses: 5 messages, oldest-first.
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].id, "q1-user");
        assert_eq!(messages[1].id, "q1-assistant");
        assert_eq!(messages[2].id, "q2-user");
        assert_eq!(messages[3].id, "q3-user");
        assert_eq!(messages[4].id, "q3-assistant");

        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].role, MessageRole::User);
    }

    #[test]
    fn assistant_metadata_carried_over() {
        let messages = reconcile(&[record("q1", 1, true)]);
        let metadata = messages[1].metadata.as_ref().unwrap();
        assert_eq!(metadata.processing_time_ms, Some(900.0));
        assert_eq!(metadata.total_tokens, Some(80));
        assert!(!metadata.tokens_estimated);
        assert_eq!(metadata.sources, vec!["notes.md"]);
        assert_eq!(messages[1].text, "answer q1");
    }

    #[test]
    fn pending_record_emits_only_user_message() {
        let messages = reconcile(&[record("q1", 1, false)]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert!(messages[0].metadata.is_none());
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let records = vec![record("q2", 2, true), record("q1", 1, false)];
        assert_eq!(reconcile(&records), reconcile(&records));
    }
}
