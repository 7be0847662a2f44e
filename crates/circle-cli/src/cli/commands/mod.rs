//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod feed;
pub mod posts;
pub mod profile;

use anyhow::{Context, Result, anyhow};
use circle_core::actions::ActionError;
use circle_core::api::{ApiClient, ApiError};
use circle_core::config::Config;
use circle_core::session::{Gate, SessionStore};
use circle_core::token_store::TokenStore;
use circle_core::types::User;

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `circle login`.";

/// Everything a command needs: resolved config plus the session store.
pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
    tokens: TokenStore,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config).context("create API client")?;
        tracing::debug!(base_url = api.base_url(), "api client ready");
        let tokens = TokenStore::default();
        let session = SessionStore::new(api, tokens.clone());
        Ok(Self {
            config,
            session,
            tokens,
        })
    }

    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    /// Restores the stored session and returns its user.
    ///
    /// Fails with the login hint when no valid session exists.
    pub async fn require_user(&self) -> Result<User> {
        let state = self.session.hydrate().await;
        match state.gate() {
            Gate::Allow(user) => Ok(user.clone()),
            Gate::Wait => Err(anyhow!("Session is still loading")),
            Gate::RedirectToLogin => Err(anyhow!(NOT_LOGGED_IN)),
        }
    }

    /// Converts a failed request into a CLI error, ending the session when the
    /// server rejected the token.
    pub fn api_failure(&self, err: ApiError, what: &str) -> anyhow::Error {
        if self.session.note_rejection(&err) {
            return anyhow!("Your session has expired. Run `circle login`.");
        }
        anyhow!("{}", err.user_message()).context(what.to_string())
    }

    pub fn action_failure(&self, err: ActionError, what: &str) -> anyhow::Error {
        match err {
            ActionError::Api(err) => self.api_failure(err, what),
            other => anyhow::Error::new(other).context(what.to_string()),
        }
    }
}
