//! Profile command handlers.

use std::path::{Path, PathBuf};

use anyhow::Result;
use circle_core::api::ImageUpload;
use circle_core::page::ProfilePage;
use circle_core::types::{Profile, ProfileUpdate};

use super::AppContext;
use super::feed::render_posts;

pub struct EditArgs {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<String>,
    pub avatar: Option<PathBuf>,
    pub cover: Option<PathBuf>,
}

pub async fn show(ctx: &AppContext, user_id: u64) -> Result<()> {
    let me = ctx.require_user().await?;

    let mut page = ProfilePage::default();
    page.posts.set_mode(ctx.config.default_sort);
    if let Err(err) = page.load(ctx.api(), user_id).await {
        return Err(ctx.api_failure(err, &format!("Failed to load profile {user_id}")));
    }
    let Some(profile) = page.profile.as_ref() else {
        anyhow::bail!("Profile {user_id} is not available");
    };

    print_profile(profile, page.is_own(me.id));
    println!();
    if page.posts.displayed().is_empty() {
        println!("No posts yet.");
    } else {
        println!("{}", render_posts(page.posts.displayed()));
    }
    Ok(())
}

pub async fn edit(ctx: &AppContext, args: EditArgs) -> Result<()> {
    let me = ctx.require_user().await?;

    let current = ctx
        .api()
        .get_profile(me.id)
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to load your profile"))?;

    let avatar = load_image(ctx, args.avatar.as_deref(), "avatar").await?;
    let cover = load_image(ctx, args.cover.as_deref(), "cover photo").await?;
    let update = ProfileUpdate {
        first_name: args.first_name,
        last_name: args.last_name,
        bio: args.bio,
        location: args.location,
        birth_date: args.birth_date,
    }
    .merged_with(&current);

    let updated = ctx
        .api()
        .update_profile(&update, avatar, cover)
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to update profile"))?;

    println!("✓ Profile updated");
    print_profile(&updated, true);
    Ok(())
}

async fn load_image(
    ctx: &AppContext,
    path: Option<&Path>,
    what: &str,
) -> Result<Option<ImageUpload>> {
    let Some(path) = path else {
        return Ok(None);
    };
    ImageUpload::from_path(path)
        .await
        .map(Some)
        .map_err(|err| ctx.api_failure(err, &format!("Failed to read {what}")))
}

fn print_profile(profile: &Profile, own: bool) {
    let user = &profile.user;
    let marker = if own { " (you)" } else { "" };
    println!("{} (@{}){marker}", user.display_name(), user.username);
    if !profile.bio.is_empty() {
        println!("  {}", profile.bio);
    }
    if !profile.location.is_empty() {
        println!("  location: {}", profile.location);
    }
    if let Some(birth_date) = profile.birth_date.as_deref() {
        println!("  born: {birth_date}");
    }
    if let Some(avatar) = profile.avatar.as_deref() {
        println!("  avatar: {avatar}");
    }
    if let Some(cover) = profile.cover_photo.as_deref() {
        println!("  cover: {cover}");
    }
}
