//! Wire types shared by the circle client crates.
//!
//! Every record here mirrors a JSON shape returned by the social API. Fields the
//! server may omit or send as `null` decode to their defaults so views never
//! have to guess at optional data.

mod auth;
mod post;
mod profile;
mod user;

pub use auth::{AuthResponse, CurrentUser, RegisterRequest, ValidationError};
pub use post::{Comment, LikeToggle, Post, PostKind, ShareToggle};
pub use profile::{Profile, ProfileUpdate};
pub use user::User;

/// Decodes `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize;

    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
