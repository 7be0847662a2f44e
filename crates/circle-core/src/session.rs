//! Session store.
//!
//! One app-scoped store tracks at most one authenticated user. Views receive it
//! explicitly and either read the current [`SessionState`] or subscribe to
//! changes through a `watch` channel.
//!
//! States move `Uninitialized → Loading → {Authenticated | Anonymous}`.
//! Login and registration move a settled session to `Authenticated`; logout and
//! token rejection move it to `Anonymous`. Anything else is ignored. Only the
//! hydration that entered `Loading` may settle it as `Authenticated`, and only
//! if nothing else settled it first.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiClient, ApiError};
use crate::token_store::{TokenStore, token_preview};
use crate::types::{RegisterRequest, User};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Startup hydration has not run yet
    #[default]
    Uninitialized,
    /// A stored token is being validated
    Loading,
    Authenticated(User),
    Anonymous,
}

/// What a protected view should do for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate<'a> {
    /// Block rendering until hydration resolves
    Wait,
    Allow(&'a User),
    /// Send the user to the login entry point
    RedirectToLogin,
}

impl SessionState {
    pub fn gate(&self) -> Gate<'_> {
        match self {
            SessionState::Uninitialized | SessionState::Loading => Gate::Wait,
            SessionState::Authenticated(user) => Gate::Allow(user),
            SessionState::Anonymous => Gate::RedirectToLogin,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_) | SessionState::Anonymous
        )
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }

    /// Transitions open to login, logout and rejection handling.
    ///
    /// `Loading → Authenticated` is absent: hydration settles through
    /// [`SessionStore::settle_hydration`] instead.
    fn allows(&self, next: &SessionState) -> bool {
        use SessionState::{Anonymous, Authenticated, Loading, Uninitialized};

        matches!(
            (self, next),
            (Uninitialized, Loading)
                | (Loading | Authenticated(_), Anonymous)
                | (Anonymous | Authenticated(_), Authenticated(_))
        )
    }
}

/// Failure of a session operation.
#[derive(Debug)]
pub enum SessionError {
    /// The server rejected the request or could not be reached
    Api(ApiError),
    /// The token could not be persisted or removed
    Storage(anyhow::Error),
    /// Startup hydration has not settled the session yet
    NotSettled,
}

impl SessionError {
    /// Text for inline display on the login and registration forms.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(err) => err.user_message(),
            SessionError::Storage(_) | SessionError::NotSettled => self.to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Api(err) => write!(f, "{err}"),
            SessionError::Storage(err) => write!(f, "Failed to store session: {err:#}"),
            SessionError::NotSettled => write!(f, "Session is still loading"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Api(err) => Some(err),
            SessionError::Storage(err) => Some(err.as_ref()),
            SessionError::NotSettled => None,
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        SessionError::Api(err)
    }
}

/// App-scoped session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    tokens: TokenStore,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            api,
            tokens,
            state: Arc::new(state),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Validates a stored token, if any, and settles the session.
    ///
    /// Only runs from `Uninitialized`; later calls return the current state.
    /// A token that fails validation for any reason is deleted. If a logout
    /// lands while the check is in flight, its result is dropped.
    pub async fn hydrate(&self) -> SessionState {
        if !self.transition(SessionState::Loading) {
            return self.state();
        }

        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "unreadable session file, discarding");
                self.discard_stored_token();
                None
            }
        };

        let Some(token) = token else {
            self.transition(SessionState::Anonymous);
            return self.state();
        };

        tracing::debug!(token = %token_preview(&token), "validating stored token");
        self.api.set_token(token);

        match self.api.current_user().await {
            Ok(current) => {
                let username = current.user.username.clone();
                if self.settle_hydration(SessionState::Authenticated(current.user), || {}) {
                    tracing::info!(user = %username, "session restored");
                }
            }
            Err(err) => {
                if err.is_server_rejection() {
                    tracing::info!(error = %err, "stored token rejected, signing out");
                } else {
                    tracing::warn!(error = %err, "could not validate stored token, discarding");
                }
                self.settle_hydration(SessionState::Anonymous, || {
                    self.api.clear_token();
                    self.discard_stored_token();
                });
            }
        }

        self.state()
    }

    /// Logs in with credentials.
    ///
    /// On failure neither the session state nor the stored token changes.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, SessionError> {
        self.ensure_settled()?;
        let response = self.api.login(username, password).await?;
        self.adopt(response.token, response.user)
    }

    /// Creates an account and logs in as it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        self.ensure_settled()?;
        let response = self.api.register(request).await?;
        self.adopt(response.token, response.user)
    }

    /// Clears the session locally. Never touches the network.
    ///
    /// The in-memory session is cleared even when removing the token file fails.
    pub fn logout(&self) -> anyhow::Result<()> {
        self.api.clear_token();
        self.transition(SessionState::Anonymous);
        self.tokens.clear()
    }

    /// Reacts to an API error seen by a view: an auth rejection ends the
    /// session. Returns true when the session was ended.
    pub fn note_rejection(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() || self.state.borrow().user().is_none() {
            return false;
        }
        tracing::info!("token rejected during use, signing out");
        self.api.clear_token();
        self.discard_stored_token();
        self.transition(SessionState::Anonymous)
    }

    fn ensure_settled(&self) -> Result<(), SessionError> {
        if !self.state.borrow().is_settled() {
            return Err(SessionError::NotSettled);
        }
        Ok(())
    }

    fn adopt(&self, token: String, user: User) -> Result<User, SessionError> {
        self.tokens.save(&token).map_err(SessionError::Storage)?;
        self.api.set_token(token);
        tracing::info!(user = %user.username, "logged in");
        self.transition(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    fn discard_stored_token(&self) {
        if let Err(err) = self.tokens.clear() {
            tracing::warn!(error = %format!("{err:#}"), "failed to remove stored token");
        }
    }

    /// Ends a hydration that is still `Loading`, running `cleanup` under the
    /// state lock first. Returns false and does nothing when something else
    /// (a logout) already settled the session.
    fn settle_hydration(&self, next: SessionState, cleanup: impl FnOnce()) -> bool {
        self.state.send_if_modified(|current| {
            if *current != SessionState::Loading {
                tracing::debug!(
                    from = current.name(),
                    to = next.name(),
                    "session settled during hydration, dropping result"
                );
                return false;
            }
            cleanup();
            tracing::debug!(from = current.name(), to = next.name(), "session transition");
            *current = next;
            true
        })
    }

    fn transition(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|current| {
            if current.allows(&next) {
                tracing::debug!(from = current.name(), to = next.name(), "session transition");
                *current = next;
                true
            } else {
                tracing::debug!(
                    from = current.name(),
                    to = next.name(),
                    "ignored session transition"
                );
                false
            }
        })
    }
}
