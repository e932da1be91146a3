use serde::{Deserialize, Serialize};

/// Request body for `POST /queries/rag` and `POST /queries/rag/stream`.
///
/// Both endpoints accept the same body; only the response shape differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagRequest {
    /// The query text.
    pub query: String,

    /// Maximum number of context chunks to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunks: Option<u32>,

    /// Minimum similarity score for retrieved chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,

    /// Sampling temperature for generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens for the generated response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the response should include source attributions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_sources: Option<bool>,

    /// Session id scoping this exchange for history lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RagRequest {
    /// Creates a new request with only the query set.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_chunks: None,
            score_threshold: None,
            temperature: None,
            max_tokens: None,
            include_sources: None,
            session_id: None,
        }
    }

    /// Sets the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: u32) -> Self {
        self.max_chunks = Some(max_chunks);
        self
    }

    /// Sets the similarity score threshold.
    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = Some(score_threshold);
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum response tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets whether source attributions are requested.
    pub fn with_include_sources(mut self, include_sources: bool) -> Self {
        self.include_sources = Some(include_sources);
        self
    }

    /// Sets the session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_request() {
        let req = RagRequest::new("what is a frame?");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"query": "what is a frame?"})
        );
    }

    #[test]
    fn full_request() {
        let req = RagRequest::new("q")
            .with_max_chunks(5)
            .with_score_threshold(0.3)
            .with_temperature(0.7)
            .with_max_tokens(1024)
            .with_include_sources(true)
            .with_session_id("s1");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_chunks"], 5);
        assert_eq!(json["session_id"], "s1");
        assert_eq!(json["include_sources"], true);
    }
}
