//! Authentication session management.
//!
//! [`AuthSession`] owns login/signup/logout, the current user, and the
//! authorization guard: a response hook on the [`RagClient`] that reacts to a
//! 401 from any call by clearing local credentials. The guard observes only;
//! the call that triggered it still resolves through its normal error path.

use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::client::{HookHandle, RagClient, ResponseHook};
use crate::observability;
use crate::token_store::TokenStore;
use crate::types::{LoginRequest, SignupRequest, TokenResponse, User};

/// Manages the bearer-token session against the service.
///
/// Shared via [`Arc`]; all methods take `&self`. The token lives in the
/// [`TokenStore`] (shared with the [`RagClient`]) so that storing it here
/// immediately authorizes subsequent requests.
pub struct AuthSession {
    client: Arc<RagClient>,
    tokens: Arc<dyn TokenStore>,
    current_user: RwLock<Option<User>>,
    guard: Mutex<Option<HookHandle>>,
}

/// The response hook that enforces authorization expiry.
///
/// Holds a weak reference so a dropped session does not linger in the
/// client's hook list as a live cycle.
struct AuthGuard {
    session: Weak<AuthSession>,
}

impl ResponseHook for AuthGuard {
    fn on_response(&self, status: u16, _path: &str) {
        if status == 401
            && let Some(session) = self.session.upgrade()
        {
            observability::AUTH_FORCED_LOGOUTS.click();
            session.logout();
        }
    }
}

impl AuthSession {
    /// Creates a new session over the given client and token store.
    ///
    /// The store should be the same one the client reads tokens from.
    pub fn new(client: Arc<RagClient>, tokens: Arc<dyn TokenStore>) -> Arc<Self> {
        Arc::new(Self {
            client,
            tokens,
            current_user: RwLock::new(None),
            guard: Mutex::new(None),
        })
    }

    /// Install the authorization guard on the client.
    ///
    /// Any prior guard installed by this session is removed first, so
    /// repeated installation never compounds hooks.
    pub fn install_guard(self: &Arc<Self>) {
        let handle = self.client.add_response_hook(Arc::new(AuthGuard {
            session: Arc::downgrade(self),
        }));
        if let Ok(mut guard) = self.guard.lock() {
            if let Some(previous) = guard.take() {
                self.client.remove_response_hook(previous);
            }
            *guard = Some(handle);
        }
    }

    /// Remove the authorization guard, restoring the client's prior
    /// behavior. A no-op when no guard is installed.
    pub fn uninstall_guard(&self) {
        if let Ok(mut guard) = self.guard.lock()
            && let Some(handle) = guard.take()
        {
            self.client.remove_response_hook(handle);
        }
    }

    /// Authenticate with email and password.
    ///
    /// On success the returned token and user are stored and `true` comes
    /// back. Any failure, transport or rejection alike, resolves to `false`
    /// with token state unchanged; nothing is thrown at the caller.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let request = LoginRequest::new(email, password);
        match self
            .client
            .post_json::<_, TokenResponse>("auth/login", &request, false)
            .await
        {
            Ok(response) => {
                self.store_credentials(response);
                observability::AUTH_LOGINS.click();
                true
            }
            Err(_) => {
                observability::AUTH_FAILURES.click();
                false
            }
        }
    }

    /// Create an account and log straight in.
    ///
    /// Same contract as [`login`](Self::login); optional model-provider
    /// preferences in the request pass through to the service unchanged.
    pub async fn signup(&self, request: SignupRequest) -> bool {
        match self
            .client
            .post_json::<_, TokenResponse>("auth/signup", &request, false)
            .await
        {
            Ok(response) => {
                self.store_credentials(response);
                observability::AUTH_LOGINS.click();
                true
            }
            Err(_) => {
                observability::AUTH_FAILURES.click();
                false
            }
        }
    }

    /// Clear the token and current user synchronously.
    ///
    /// Requests already in flight are not cancelled; they settle against the
    /// credentials they were sent with.
    pub fn logout(&self) {
        self.tokens.set(None);
        if let Ok(mut user) = self.current_user.write() {
            *user = None;
        }
    }

    /// Returns the current authenticated user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().ok()?.clone()
    }

    /// Returns true when a bearer token is present.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.get().is_some()
    }

    fn store_credentials(&self, response: TokenResponse) {
        self.tokens.set(Some(&response.access_token));
        if let Ok(mut user) = self.current_user.write() {
            *user = Some(response.user);
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    fn session() -> (Arc<AuthSession>, Arc<MemoryTokenStore>, Arc<RagClient>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        let client = Arc::new(
            RagClient::new("http://localhost:8000/", tokens.clone() as Arc<dyn TokenStore>)
                .unwrap(),
        );
        let session = AuthSession::new(client.clone(), tokens.clone());
        (session, tokens, client)
    }

    #[test]
    fn logout_clears_token_and_user() {
        let (session, tokens, _client) = session();
        tokens.set(Some("tok1"));
        assert!(session.is_authenticated());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert_eq!(tokens.get(), None);
    }

    #[test]
    fn guard_installation_is_idempotent() {
        let (session, _tokens, client) = session();

        session.install_guard();
        assert_eq!(client.response_hook_count(), 1);

        // Re-installation replaces rather than stacks.
        session.install_guard();
        session.install_guard();
        assert_eq!(client.response_hook_count(), 1);

        session.uninstall_guard();
        assert_eq!(client.response_hook_count(), 0);

        // Uninstalling twice is a no-op.
        session.uninstall_guard();
        assert_eq!(client.response_hook_count(), 0);
    }

    #[test]
    fn guard_logs_out_on_401_only() {
        let (session, tokens, client) = session();
        session.install_guard();
        tokens.set(Some("tok1"));

        client.notify_hooks(200, "queries/rag");
        assert!(session.is_authenticated());

        client.notify_hooks(500, "queries/rag");
        assert!(session.is_authenticated());

        client.notify_hooks(401, "queries/history");
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn dropped_session_guard_is_inert() {
        let (session, tokens, client) = session();
        session.install_guard();
        drop(session);

        // The weak reference no longer upgrades; the hook fires but touches
        // nothing.
        tokens.set(Some("tok1"));
        client.notify_hooks(401, "queries/rag");
        assert_eq!(tokens.get(), Some("tok1".to_string()));
    }
}
