//! Like, share, and comment round trips.
//!
//! Each action waits for the server and reports exactly what it returned; no
//! counter is ever predicted locally. A repeat of the same action on the same
//! post while the first is still in flight is refused instead of sent.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::{ApiClient, ApiError};
use crate::types::{Comment, LikeToggle, ShareToggle};

/// Which interaction is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Like,
    Share,
    Comment,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Like => write!(f, "like"),
            ActionKind::Share => write!(f, "share"),
            ActionKind::Comment => write!(f, "comment"),
        }
    }
}

/// Server-confirmed result of an action, ready to merge into view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Liked { post_id: u64, toggle: LikeToggle },
    Shared { post_id: u64, toggle: ShareToggle },
    Commented { post_id: u64, comment: Comment },
}

impl ActionOutcome {
    pub fn post_id(&self) -> u64 {
        match self {
            ActionOutcome::Liked { post_id, .. }
            | ActionOutcome::Shared { post_id, .. }
            | ActionOutcome::Commented { post_id, .. } => *post_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ActionError {
    /// The same action on the same post has not finished yet
    InFlight { post_id: u64, kind: ActionKind },
    /// Comment text was blank
    EmptyComment,
    Api(ApiError),
}

impl ActionError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ActionError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::InFlight { post_id, kind } => {
                write!(f, "A {kind} on post {post_id} is already in progress")
            }
            ActionError::EmptyComment => write!(f, "Comment cannot be empty"),
            ActionError::Api(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for ActionError {
    fn from(err: ApiError) -> Self {
        ActionError::Api(err)
    }
}

type InFlightSet = Arc<Mutex<HashSet<(u64, ActionKind)>>>;

/// Releases an in-flight slot when the request finishes or is dropped.
struct Slot {
    key: (u64, ActionKind),
    set: InFlightSet,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Post interactions with per-(post, action) request coalescing.
#[derive(Debug, Clone)]
pub struct PostActions {
    api: ApiClient,
    in_flight: InFlightSet,
}

impl PostActions {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: Arc::default(),
        }
    }

    /// True while the given action on `post_id` awaits the server.
    pub fn is_in_flight(&self, post_id: u64, kind: ActionKind) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(post_id, kind))
    }

    pub async fn toggle_like(&self, post_id: u64) -> Result<ActionOutcome, ActionError> {
        let _slot = self.claim(post_id, ActionKind::Like)?;
        let toggle = self.api.toggle_like(post_id).await?;
        Ok(ActionOutcome::Liked { post_id, toggle })
    }

    pub async fn toggle_share(&self, post_id: u64) -> Result<ActionOutcome, ActionError> {
        let _slot = self.claim(post_id, ActionKind::Share)?;
        let toggle = self.api.toggle_share(post_id).await?;
        Ok(ActionOutcome::Shared { post_id, toggle })
    }

    pub async fn add_comment(
        &self,
        post_id: u64,
        content: &str,
    ) -> Result<ActionOutcome, ActionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ActionError::EmptyComment);
        }
        let _slot = self.claim(post_id, ActionKind::Comment)?;
        let comment = self.api.create_comment(post_id, content).await?;
        Ok(ActionOutcome::Commented { post_id, comment })
    }

    fn claim(&self, post_id: u64, kind: ActionKind) -> Result<Slot, ActionError> {
        let key = (post_id, kind);
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key) {
            tracing::debug!(post_id, %kind, "duplicate action refused");
            return Err(ActionError::InFlight { post_id, kind });
        }
        Ok(Slot {
            key,
            set: Arc::clone(&self.in_flight),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions() -> PostActions {
        PostActions::new(ApiClient::new("http://127.0.0.1:9/api", None).unwrap())
    }

    #[test]
    fn test_claim_refuses_duplicate_until_released() {
        let actions = actions();
        let slot = actions.claim(5, ActionKind::Like).unwrap();
        assert!(actions.is_in_flight(5, ActionKind::Like));
        assert!(matches!(
            actions.claim(5, ActionKind::Like),
            Err(ActionError::InFlight { post_id: 5, kind: ActionKind::Like })
        ));

        // other posts and other actions are independent
        let _other_post = actions.claim(6, ActionKind::Like).unwrap();
        let _other_kind = actions.claim(5, ActionKind::Share).unwrap();

        drop(slot);
        assert!(!actions.is_in_flight(5, ActionKind::Like));
        assert!(actions.claim(5, ActionKind::Like).is_ok());
    }

    #[tokio::test]
    async fn test_blank_comment_rejected_before_network() {
        let err = actions().add_comment(1, "   ").await.unwrap_err();
        assert!(matches!(err, ActionError::EmptyComment));
    }

    #[tokio::test]
    async fn test_failed_request_releases_slot() {
        let actions = actions();
        let err = actions.toggle_like(3).await.unwrap_err();
        assert!(err.api().is_some());
        assert!(!actions.is_in_flight(3, ActionKind::Like));
    }
}
