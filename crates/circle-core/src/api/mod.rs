//! HTTP client for the social API.
//!
//! Every response body is decoded into the strict types from `circle-types`
//! here, at the boundary; callers never see loosely-typed JSON.

mod error;

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

pub use self::error::{ApiError, ApiErrorKind};
use crate::config::Config;
use crate::types::{
    AuthResponse, Comment, CurrentUser, LikeToggle, Post, PostKind, Profile, ProfileUpdate,
    RegisterRequest, ShareToggle,
};

/// Standard User-Agent header for circle API requests.
pub const USER_AGENT: &str = concat!("circle/", env!("CARGO_PKG_VERSION"));

/// An image attached to a post or profile edit.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reads an image file, sniffing its MIME type from the content.
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::validation(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mime_type = infer::get(&bytes)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .map(|kind| kind.mime_type().to_string())
            .ok_or_else(|| {
                ApiError::validation(format!("{} is not a supported image", path.display()))
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    fn into_part(self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|e| ApiError::validation(format!("Invalid image type: {e}")))
    }
}

/// Fields for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Rich-text markup from the editor
    pub content: String,
    pub image: Option<ImageUpload>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

/// Client for the social REST API.
///
/// Cloning is cheap; clones share the HTTP pool and the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("authenticated", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::from_reqwest(&e))?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Builds a client from the resolved config (env > config > default URL).
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = config.effective_base_url()?;
        Ok(Self::new(&base_url, config.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = json!({ "username": username, "password": password });
        self.send(self.request(Method::POST, "auth/login/").json(&body))
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;
        self.send(self.request(Method::POST, "auth/register/").json(request))
            .await
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.send(self.request(Method::GET, "auth/user/")).await
    }

    /// Deletes the token server-side. Local logout does not depend on this.
    pub async fn revoke_token(&self) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "auth/logout/"))
            .await
            .map(drop)
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.send(self.request(Method::GET, "posts/")).await
    }

    pub async fn list_user_posts(&self, user_id: u64) -> Result<Vec<Post>, ApiError> {
        self.send(self.request(Method::GET, &format!("users/{user_id}/posts/")))
            .await
    }

    pub async fn recent_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.send(self.request(Method::GET, "posts/recent/")).await
    }

    pub async fn get_post(&self, post_id: u64) -> Result<Post, ApiError> {
        self.send(self.request(Method::GET, &format!("posts/{post_id}/")))
            .await
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Post, ApiError> {
        if crate::rich_text::is_blank(&post.content) {
            return Err(ApiError::validation("Post content cannot be empty"));
        }
        let kind = PostKind::for_submission(post.image.is_some());
        let mut form = Form::new()
            .text("content", post.content)
            .text("post_type", kind.as_str());
        if let Some(image) = post.image {
            form = form.part("image", image.into_part()?);
        }
        self.send(self.request(Method::POST, "posts/").multipart(form))
            .await
    }

    pub async fn toggle_like(&self, post_id: u64) -> Result<LikeToggle, ApiError> {
        self.send(self.request(Method::POST, &format!("posts/{post_id}/like/")))
            .await
    }

    pub async fn toggle_share(&self, post_id: u64) -> Result<ShareToggle, ApiError> {
        self.send(self.request(Method::POST, &format!("posts/{post_id}/share/")))
            .await
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn list_comments(&self, post_id: u64) -> Result<Vec<Comment>, ApiError> {
        self.send(self.request(Method::GET, &format!("posts/{post_id}/comments/")))
            .await
    }

    pub async fn create_comment(&self, post_id: u64, content: &str) -> Result<Comment, ApiError> {
        let body = json!({ "content": content });
        self.send(
            self.request(Method::POST, &format!("posts/{post_id}/comments/"))
                .json(&body),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub async fn get_profile(&self, user_id: u64) -> Result<Profile, ApiError> {
        self.send(self.request(Method::GET, &format!("users/{user_id}/profile/")))
            .await
    }

    /// Updates the caller's profile. Text fields are always sent; images only
    /// when provided.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        avatar: Option<ImageUpload>,
        cover_photo: Option<ImageUpload>,
    ) -> Result<Profile, ApiError> {
        let mut form = Form::new();
        for (name, value) in update.form_fields() {
            form = form.text(name, value);
        }
        if let Some(avatar) = avatar {
            form = form.part("avatar", avatar.into_part()?);
        }
        if let Some(cover) = cover_photo {
            form = form.part("cover_photo", cover.into_part()?);
        }
        self.send(self.request(Method::PATCH, "profile/").multipart(form))
            .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.inner.http.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let request = builder.build().map_err(|e| ApiError::from_reqwest(&e))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(%method, %path, "api request");

        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::from_reqwest(&e))
            .inspect_err(|err| {
                tracing::warn!(%method, %path, kind = %err.kind, "api request failed");
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        if !status.is_success() {
            let err = ApiError::http_status(status.as_u16(), &body);
            tracing::warn!(%method, %path, status = status.as_u16(), "api request rejected");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "api response did not decode");
            ApiError {
                details: Some(body.clone()),
                ..ApiError::parse(format!("Unexpected response from {path}: {e}"))
            }
        })
    }
}
