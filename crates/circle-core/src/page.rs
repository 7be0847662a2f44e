//! Per-screen view state.
//!
//! A page owns its posts privately; nothing here is shared between screens.
//! The displayed list is re-derived from the source and the filter after every
//! change, and results that arrive after the page is unmounted are dropped.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::actions::{ActionError, ActionOutcome};
use crate::api::{ApiClient, ApiError};
use crate::feed::{self, FeedFilter, SortMode};
use crate::types::{Comment, Post, Profile};

/// Transient error indicator shown after a failed fetch or action.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    /// Whether the notice should still be shown.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.raised_at.elapsed() < ttl
    }
}

/// Cheap handle that in-flight work checks before touching page state.
#[derive(Debug, Clone)]
pub struct MountGuard {
    token: CancellationToken,
}

impl MountGuard {
    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Runs `fut` unless the page unmounts first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            () = self.token.cancelled() => None,
            output = fut => Some(output),
        }
    }
}

/// Which list a feed page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    All,
    User(u64),
    Recent,
}

impl FeedSource {
    pub async fn fetch(self, api: &ApiClient) -> Result<Vec<Post>, ApiError> {
        match self {
            FeedSource::All => api.list_posts().await,
            FeedSource::User(user_id) => api.list_user_posts(user_id).await,
            FeedSource::Recent => api.recent_posts().await,
        }
    }
}

/// View state of a feed screen.
#[derive(Debug)]
pub struct FeedPage {
    source: Vec<Post>,
    filter: FeedFilter,
    displayed: Vec<Post>,
    drafts: HashMap<u64, String>,
    notice: Option<Notice>,
    mount: CancellationToken,
}

impl Default for FeedPage {
    fn default() -> Self {
        Self::new(SortMode::default())
    }
}

impl FeedPage {
    pub fn new(mode: SortMode) -> Self {
        Self {
            source: Vec::new(),
            filter: FeedFilter::new(String::new(), mode),
            displayed: Vec::new(),
            drafts: HashMap::new(),
            notice: None,
            mount: CancellationToken::new(),
        }
    }

    pub fn source(&self) -> &[Post] {
        &self.source
    }

    pub fn displayed(&self) -> &[Post] {
        &self.displayed
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn guard(&self) -> MountGuard {
        MountGuard {
            token: self.mount.clone(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.mount.is_cancelled()
    }

    /// Marks the page as gone; pending results will be discarded.
    pub fn unmount(&self) {
        self.mount.cancel();
    }

    /// Replaces the source list. Returns false if the page is unmounted.
    pub fn load(&mut self, posts: Vec<Post>) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.source = posts;
        self.rederive();
        true
    }

    /// Fetches `source` from the API and loads it.
    ///
    /// Failures raise a notice and keep the previous list.
    pub async fn refresh(&mut self, source: FeedSource, api: &ApiClient) -> bool {
        match self.guard().run(source.fetch(api)).await {
            None => false,
            Some(Ok(posts)) => self.load(posts),
            Some(Err(err)) => {
                self.fail(&err);
                false
            }
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
        self.rederive();
    }

    pub fn set_mode(&mut self, mode: SortMode) {
        self.filter.mode = mode;
        self.rederive();
    }

    pub fn draft(&self, post_id: u64) -> &str {
        self.drafts.get(&post_id).map_or("", String::as_str)
    }

    pub fn set_draft(&mut self, post_id: u64, text: impl Into<String>) {
        self.drafts.insert(post_id, text.into());
    }

    /// Adds a post the user just created to the top of the source list.
    pub fn insert_created(&mut self, post: Post) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.source.insert(0, post);
        self.rederive();
        true
    }

    /// Replaces a post's comment list with a freshly fetched one.
    pub fn replace_comments(&mut self, post_id: u64, comments: Vec<Comment>) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let Some(post) = self.source.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };
        post.comments_count = comments.len() as u64;
        post.comments = comments;
        self.rederive();
        true
    }

    /// Merges a server-confirmed result.
    ///
    /// Counters and flags take exactly the server's values. Returns false when
    /// the page is unmounted or the post is not on this page.
    pub fn apply(&mut self, outcome: ActionOutcome) -> bool {
        if !self.is_mounted() {
            tracing::debug!(post_id = outcome.post_id(), "dropping result for unmounted page");
            return false;
        }
        let post_id = outcome.post_id();
        let Some(post) = self.source.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };

        match outcome {
            ActionOutcome::Liked { toggle, .. } => {
                post.is_liked = toggle.liked;
                post.likes_count = toggle.likes_count;
            }
            ActionOutcome::Shared { toggle, .. } => {
                post.is_shared = toggle.shared;
                post.shares_count = toggle.shares_count;
            }
            ActionOutcome::Commented { comment, .. } => {
                post.comments.push(comment);
                post.comments_count = post.comments.len() as u64;
                self.drafts.remove(&post_id);
            }
        }

        self.rederive();
        true
    }

    /// Records a failed request. Posts and drafts stay as they were.
    pub fn fail(&mut self, err: &dyn fmt::Display) -> bool {
        if !self.is_mounted() {
            return false;
        }
        tracing::warn!(error = %err, "feed request failed");
        self.notice = Some(Notice::new(err.to_string()));
        true
    }

    /// Awaits an action and merges its result, unless the page unmounts first.
    pub async fn settle<F>(&mut self, action: F) -> bool
    where
        F: Future<Output = Result<ActionOutcome, ActionError>>,
    {
        match self.guard().run(action).await {
            None => false,
            Some(Ok(outcome)) => self.apply(outcome),
            Some(Err(err)) => {
                self.fail(&err);
                false
            }
        }
    }

    fn rederive(&mut self) {
        self.displayed = feed::apply(&self.source, &self.filter);
    }
}

/// View state of a profile screen: the profile plus that user's posts.
#[derive(Debug, Default)]
pub struct ProfilePage {
    pub profile: Option<Profile>,
    pub posts: FeedPage,
    /// Inline error for the profile form
    pub error: Option<String>,
}

impl ProfilePage {
    /// Loads profile and posts together.
    pub async fn load(&mut self, api: &ApiClient, user_id: u64) -> Result<(), ApiError> {
        let guard = self.posts.guard();
        let fetched = guard
            .run(async {
                tokio::try_join!(api.get_profile(user_id), api.list_user_posts(user_id))
            })
            .await;
        match fetched {
            None => Ok(()),
            Some(Ok((profile, posts))) => {
                self.profile = Some(profile);
                self.error = None;
                self.posts.load(posts);
                Ok(())
            }
            Some(Err(err)) => {
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// True when the profile belongs to `user_id`.
    pub fn is_own(&self, user_id: u64) -> bool {
        self.profile.as_ref().is_some_and(|p| p.user.id == user_id)
    }
}
