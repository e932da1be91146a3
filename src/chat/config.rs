//! Configuration types for chat sessions.
//!
//! This module provides CLI argument parsing via `arrrg` for the demo binary
//! and the configuration structure controlling send behavior.

use arrrg_derive::CommandLine;

use crate::types::SessionId;

/// Default history page size fetched at hydration.
const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Command-line arguments for the ragline-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the RAG service.
    #[arrrg(optional, "Service base URL (default: http://localhost:8000)", "URL")]
    pub url: Option<String>,

    /// Email to log in with at startup.
    #[arrrg(optional, "Email to log in with at startup", "EMAIL")]
    pub email: Option<String>,

    /// Session id to resume instead of starting a fresh scope.
    #[arrrg(optional, "Session id to resume", "SESSION")]
    pub session: Option<String>,

    /// Disable streaming; wait for complete responses.
    #[arrrg(flag, "Disable streaming responses")]
    pub no_stream: bool,

    /// History page size fetched at startup.
    #[arrrg(optional, "History records to fetch at startup (default: 50)", "N")]
    pub history_limit: Option<u32>,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values controlling how
/// queries are dispatched and how history is hydrated.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Whether sends use the streaming endpoint.
    pub streaming: bool,

    /// Maximum context chunks per query, when overridden.
    pub max_chunks: Option<u32>,

    /// Similarity score threshold per query, when overridden.
    pub score_threshold: Option<f32>,

    /// Sampling temperature per query, when overridden.
    pub temperature: Option<f32>,

    /// Maximum response tokens per query, when overridden.
    pub max_tokens: Option<u32>,

    /// Whether non-streaming responses should carry source attributions.
    pub include_sources: bool,

    /// History records fetched at hydration.
    pub history_limit: u32,

    /// Session id to resume. `None` uses the process-scoped id.
    pub session_id: Option<SessionId>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Streaming: enabled
    /// - Sources: requested
    /// - History limit: 50
    /// - Session: process-scoped
    pub fn new() -> Self {
        Self {
            streaming: true,
            max_chunks: None,
            score_threshold: None,
            temperature: None,
            max_tokens: None,
            include_sources: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            session_id: None,
        }
    }

    /// Sets whether sends stream.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Sets the maximum context chunks per query.
    pub fn with_max_chunks(mut self, max_chunks: Option<u32>) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Sets the similarity score threshold.
    pub fn with_score_threshold(mut self, score_threshold: Option<f32>) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum response tokens.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets whether source attributions are requested.
    pub fn with_include_sources(mut self, include_sources: bool) -> Self {
        self.include_sources = include_sources;
        self
    }

    /// Sets the history page size fetched at hydration.
    pub fn with_history_limit(mut self, history_limit: u32) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Sets the session id to resume.
    pub fn with_session_id(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            streaming: !args.no_stream,
            history_limit: args.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            session_id: args.session.map(SessionId::from),
            ..ChatConfig::new()
        }
    }
}
