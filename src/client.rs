//! HTTP client for a RAG service.
//!
//! [`RagClient`] wraps a `reqwest` client with bearer-token authorization and
//! a list of response hooks. The client is an explicit capability passed by
//! reference to every caller; there is no ambient global state. Hooks observe
//! the status of every response that passes through the client (they never
//! alter it), which is how authorization expiry is intercepted process-wide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::Stream;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability;
use crate::token_store::TokenStore;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Observes responses passing through a [`RagClient`].
///
/// Hooks see every response's status, success or failure, before the caller
/// does; they must not block and cannot alter the response. The canonical
/// hook is the authorization guard installed by
/// [`AuthSession`](crate::AuthSession).
pub trait ResponseHook: Send + Sync {
    /// Called once per response with its HTTP status and request path.
    fn on_response(&self, status: u16, path: &str);
}

/// Identifies an installed hook so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookHandle(u64);

/// Client for a conversational RAG service.
///
/// Cheap to share via [`Arc`]; all methods take `&self`.
pub struct RagClient {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    tokens: Arc<dyn TokenStore>,
    hooks: RwLock<Vec<(u64, Arc<dyn ResponseHook>)>>,
    next_hook_id: AtomicU64,
}

impl RagClient {
    /// Create a new client for the service at `base_url`.
    ///
    /// The bearer token is read from `tokens` on every authorized request, so
    /// a login that lands mid-session takes effect immediately.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_options(base_url, tokens, None)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_options(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut base_url = base_url.into();
        Url::parse(&base_url)?;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            tokens,
            hooks: RwLock::new(Vec::new()),
            next_hook_id: AtomicU64::new(1),
        })
    }

    /// Returns the base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install a response hook; returns a handle for removal.
    ///
    /// Installing the same hook object twice produces two distinct handles
    /// (and two notifications per response); callers that want idempotent
    /// installation remove their previous handle first.
    pub fn add_response_hook(&self, hook: Arc<dyn ResponseHook>) -> HookHandle {
        let id = self.next_hook_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.push((id, hook));
        }
        HookHandle(id)
    }

    /// Remove a previously installed hook. Removing an already-removed
    /// handle is a no-op.
    pub fn remove_response_hook(&self, handle: HookHandle) {
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.retain(|(id, _)| *id != handle.0);
        }
    }

    /// Number of currently installed hooks.
    pub fn response_hook_count(&self) -> usize {
        self.hooks.read().map(|hooks| hooks.len()).unwrap_or(0)
    }

    pub(crate) fn notify_hooks(&self, status: u16, path: &str) {
        let hooks: Vec<Arc<dyn ResponseHook>> = match self.hooks.read() {
            Ok(hooks) => hooks.iter().map(|(_, hook)| Arc::clone(hook)).collect(),
            Err(_) => return,
        };
        for hook in hooks {
            hook.on_response(status, path);
        }
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, authorized: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if authorized
            && let Some(token) = self.tokens.get()
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        // The service reports errors as {"detail": "..."}.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        // A non-JSON body falls back to the HTTP status reason.
        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        // Map HTTP status code to appropriate error type
        match status_code {
            400 => Error::bad_request(error_message, None),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, None),
            _ => Error::api(status_code, error_message),
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder, path: &str) -> Result<Response> {
        observability::CLIENT_REQUESTS.click();
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            observability::CLIENT_REQUEST_ERRORS.click();
            self.map_transport_error(e)
        })?;
        observability::CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        self.notify_hooks(response.status().as_u16(), path);

        if !response.status().is_success() {
            observability::CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// POST a JSON body and parse a JSON response.
    ///
    /// `authorized` controls whether the bearer token is attached; the
    /// authentication endpoints themselves are called unauthorized.
    pub async fn post_json<B, T>(&self, path: &str, body: &B, authorized: bool) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .post(&url)
            .headers(self.default_headers(authorized))
            .json(body);

        let response = self.execute(request, path).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// GET a JSON response, with optional query parameters.
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(&url)
            .headers(self.default_headers(true))
            .query(query);

        let response = self.execute(request, path).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// POST a JSON body and return the raw byte stream of the response.
    ///
    /// The caller feeds the stream through
    /// [`decode_frames`](crate::sse::decode_frames); errors reading the body
    /// mid-stream surface there as streaming errors.
    pub async fn post_stream<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut headers = self.default_headers(true);
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let request = self.client.post(&url).headers(headers).json(body);

        let response = self.execute(request, path).await?;
        Ok(response.bytes_stream())
    }
}

impl std::fmt::Debug for RagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("hooks", &self.response_hook_count())
            .finish()
    }
}
