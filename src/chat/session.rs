//! Core chat session management.
//!
//! This module provides the [`ChatSession`] struct which owns the ordered
//! conversation transcript and drives query exchanges against the service,
//! streaming or blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthSession;
use crate::chat::config::ChatConfig;
use crate::client::RagClient;
use crate::error::Result;
use crate::observability;
use crate::types::{
    HistoryPage, Message, MessageMetadata, RagRequest, RagResponse, SessionId,
};
use crate::{history, sse};

/// Streaming token counts are estimated at roughly four characters per token;
/// the streaming endpoint never reports exact usage.
const CHARS_PER_TOKEN: usize = 4;

/// A chat session that manages conversation state and service interactions.
///
/// The session holds the transcript behind interior mutability, so it is
/// shared via [`Arc`] and every method takes `&self`. At most one exchange is
/// in flight at a time: a send that arrives while another is pending is a
/// no-op, never queued.
pub struct ChatSession {
    client: Arc<RagClient>,
    auth: Arc<AuthSession>,
    config: ChatConfig,
    session_id: SessionId,
    streaming: AtomicBool,
    messages: RwLock<Vec<Message>>,
    busy: AtomicBool,
    loading: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The session id scoping this conversation.
    pub session_id: SessionId,
    /// The number of messages in the transcript.
    pub message_count: usize,
    /// Whether sends use the streaming endpoint.
    pub streaming: bool,
    /// Whether a bearer token is currently held.
    pub authenticated: bool,
}

impl ChatSession {
    /// Creates a new session over the given client and auth session.
    ///
    /// The session id comes from the configuration when set, falling back to
    /// the process-scoped id so that restarts within one process resume the
    /// same history scope.
    pub fn new(client: Arc<RagClient>, auth: Arc<AuthSession>, config: ChatConfig) -> Self {
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(SessionId::process_scoped);
        let streaming = AtomicBool::new(config.streaming);
        Self {
            client,
            auth,
            config,
            session_id,
            streaming,
            messages: RwLock::new(Vec::new()),
            busy: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Returns the session id scoping this conversation.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the auth session this chat runs under.
    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    /// Returns a snapshot of the transcript, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Returns the number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.messages.read().map(|messages| messages.len()).unwrap_or(0)
    }

    /// Returns true while an exchange is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Returns true while a hydration fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Whether sends use the streaming endpoint.
    pub fn streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Toggle streaming on or off for subsequent sends.
    pub fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::SeqCst);
    }

    /// Returns aggregated stats for the session.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id.clone(),
            message_count: self.message_count(),
            streaming: self.streaming(),
            authenticated: self.auth.is_authenticated(),
        }
    }

    /// Clear the transcript.
    ///
    /// Clearing affects only local state; server-side history is untouched
    /// and a later [`hydrate`](Self::hydrate) brings it back. Returns `false`
    /// without clearing while an exchange is in flight.
    pub fn clear(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        if let Ok(mut messages) = self.messages.write() {
            messages.clear();
        }
        true
    }

    /// Cancel the in-flight exchange, if any.
    ///
    /// The pending send settles promptly with whatever partial text it has
    /// accumulated. A no-op when nothing is in flight.
    pub fn cancel(&self) {
        if let Ok(mut cancel) = self.cancel.lock()
            && let Some(token) = cancel.take()
        {
            token.cancel();
        }
    }

    /// Fetch persisted history and replace the transcript with it.
    ///
    /// Returns `true` when the transcript was replaced. Hydration is a no-op
    /// while an exchange is in flight (the live transcript wins), when the
    /// fetch fails, or when the server has no records for this session; the
    /// failure modes degrade to the transcript already on screen rather than
    /// surfacing an error.
    pub async fn hydrate(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.loading.store(true, Ordering::SeqCst);
        let query = [
            ("skip", "0".to_string()),
            ("limit", self.config.history_limit.to_string()),
            ("session_id", self.session_id.as_str().to_string()),
        ];
        let result = self
            .client
            .get_json::<HistoryPage>("queries/history", &query)
            .await;
        self.loading.store(false, Ordering::SeqCst);

        let page = match result {
            Ok(page) => page,
            Err(_) => {
                observability::CHAT_HYDRATION_FAILURES.click();
                return false;
            }
        };

        let hydrated = history::reconcile(&page.queries);
        if hydrated.is_empty() {
            return false;
        }
        // A send may have started while the fetch was in flight; the live
        // transcript wins over the stale page.
        if self.is_busy() {
            return false;
        }
        if let Ok(mut messages) = self.messages.write() {
            *messages = hydrated;
            return true;
        }
        false
    }

    /// Send a query and settle the resulting exchange into the transcript.
    ///
    /// Returns `Ok(false)` without side effects when another exchange is
    /// already in flight. Otherwise the user message and an empty assistant
    /// placeholder are appended immediately; the placeholder fills in as the
    /// exchange progresses (appended per frame when streaming, wholesale when
    /// blocking) and gains metadata once it settles.
    ///
    /// On failure the placeholder settles with an `Error: ...` marker, its
    /// metadata absent, and the error is also returned so the caller can log
    /// it. A cancelled exchange settles with its partial text and resolves
    /// `Ok(true)`.
    pub async fn send(&self, query: &str) -> Result<bool> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            observability::CHAT_SEND_REJECTED.click();
            return Ok(false);
        }
        observability::CHAT_SENDS.click();
        let start = Instant::now();

        let placeholder_id = {
            let placeholder = Message::assistant_placeholder();
            let id = placeholder.id.clone();
            if let Ok(mut messages) = self.messages.write() {
                messages.push(Message::user(query));
                messages.push(placeholder);
            }
            id
        };

        let token = CancellationToken::new();
        if let Ok(mut cancel) = self.cancel.lock() {
            *cancel = Some(token.clone());
        }

        let outcome = if self.streaming() {
            self.exchange_streaming(query, &placeholder_id, &token, start)
                .await
        } else {
            self.exchange_blocking(query, &placeholder_id, start).await
        };

        if let Ok(mut cancel) = self.cancel.lock() {
            *cancel = None;
        }
        observability::CHAT_SEND_DURATION.add(start.elapsed().as_secs_f64());
        self.busy.store(false, Ordering::SeqCst);

        match outcome {
            Ok(()) => Ok(true),
            Err(err) => {
                observability::CHAT_SEND_ERRORS.click();
                self.update_message(&placeholder_id, |message| {
                    message.text = format!("Error: {err}");
                    message.metadata = None;
                });
                Err(err)
            }
        }
    }

    async fn exchange_blocking(
        &self,
        query: &str,
        placeholder_id: &str,
        start: Instant,
    ) -> Result<()> {
        let request = self.build_request(query);
        let response: RagResponse = self.client.post_json("queries/rag", &request, true).await?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.update_message(placeholder_id, |message| {
            message.text = response.response.clone();
            message.metadata = Some(MessageMetadata {
                processing_time_ms: response.processing_time_ms.or(Some(elapsed_ms)),
                total_tokens: Some(response.total_tokens),
                tokens_estimated: false,
                sources: response.source_attribution.clone(),
            });
        });
        Ok(())
    }

    async fn exchange_streaming(
        &self,
        query: &str,
        placeholder_id: &str,
        token: &CancellationToken,
        start: Instant,
    ) -> Result<()> {
        let request = self.build_request(query);
        let byte_stream = self.client.post_stream("queries/rag/stream", &request).await?;
        let mut frames = Box::pin(sse::decode_frames(byte_stream));

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    observability::CHAT_SEND_CANCELLED.click();
                    break;
                }
                frame = frames.next() => {
                    match frame {
                        Some(Ok(chunk)) => {
                            self.update_message(placeholder_id, |message| {
                                message.text.push_str(&chunk);
                            });
                        }
                        Some(Err(err)) => return Err(err),
                        None => break,
                    }
                }
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.update_message(placeholder_id, |message| {
            let estimate = (message.text.chars().count() / CHARS_PER_TOKEN) as u32;
            message.metadata = Some(MessageMetadata {
                processing_time_ms: Some(elapsed_ms),
                total_tokens: Some(estimate),
                tokens_estimated: true,
                sources: Vec::new(),
            });
        });
        Ok(())
    }

    fn build_request(&self, query: &str) -> RagRequest {
        let mut request = RagRequest::new(query).with_session_id(self.session_id.as_str());
        request.max_chunks = self.config.max_chunks;
        request.score_threshold = self.config.score_threshold;
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;
        request.include_sources = Some(self.config.include_sources);
        request
    }

    fn update_message(&self, id: &str, update: impl FnOnce(&mut Message)) {
        if let Ok(mut messages) = self.messages.write()
            && let Some(message) = messages.iter_mut().find(|message| message.id == id)
        {
            update(message);
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("session_id", &self.session_id)
            .field("messages", &self.message_count())
            .field("busy", &self.is_busy())
            .finish()
    }
}
