//! Post command handlers.

use std::path::PathBuf;

use anyhow::Result;
use circle_core::actions::{ActionOutcome, PostActions};
use circle_core::api::{ImageUpload, NewPost};
use circle_core::rich_text::{self, InlineStyle, MarkupBuffer, TextEditor};
use circle_core::types::Comment;

use super::AppContext;
use super::feed::format_timestamp;

pub struct PostArgs {
    pub content: String,
    pub image: Option<PathBuf>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl PostArgs {
    fn styles(&self) -> impl Iterator<Item = InlineStyle> {
        [
            (self.bold, InlineStyle::Bold),
            (self.italic, InlineStyle::Italic),
            (self.underline, InlineStyle::Underline),
        ]
        .into_iter()
        .filter_map(|(on, style)| on.then_some(style))
    }
}

pub async fn create(ctx: &AppContext, args: PostArgs) -> Result<()> {
    ctx.require_user().await?;

    let mut editor = MarkupBuffer::new(args.content.trim());
    for style in args.styles() {
        editor.apply(style);
    }

    let image = match args.image.as_deref() {
        Some(path) => Some(
            ImageUpload::from_path(path)
                .await
                .map_err(|err| ctx.api_failure(err, "Failed to attach image"))?,
        ),
        None => None,
    };

    let post = ctx
        .api()
        .create_post(NewPost {
            content: editor.into_html(),
            image,
        })
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to publish post"))?;

    println!("✓ Published post #{} ({})", post.id, post.post_type.as_str());
    Ok(())
}

pub async fn like(ctx: &AppContext, post_id: u64) -> Result<()> {
    ctx.require_user().await?;
    let outcome = PostActions::new(ctx.api().clone())
        .toggle_like(post_id)
        .await
        .map_err(|err| ctx.action_failure(err, "Failed to update like"))?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn share(ctx: &AppContext, post_id: u64) -> Result<()> {
    ctx.require_user().await?;
    let outcome = PostActions::new(ctx.api().clone())
        .toggle_share(post_id)
        .await
        .map_err(|err| ctx.action_failure(err, "Failed to update share"))?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn show(ctx: &AppContext, post_id: u64) -> Result<()> {
    ctx.require_user().await?;
    let post = ctx
        .api()
        .get_post(post_id)
        .await
        .map_err(|err| ctx.api_failure(err, &format!("Failed to load post {post_id}")))?;

    println!(
        "#{} {} (@{}) · {}",
        post.id,
        post.author.display_name(),
        post.author.username,
        format_timestamp(&post.created_at)
    );
    println!("{}", rich_text::plain_text(&post.content));
    if let Some(image) = post.image.as_deref() {
        println!("[image] {image}");
    }
    println!(
        "{} likes · {} comments · {} shares",
        post.likes_count, post.comments_count, post.shares_count
    );
    for comment in &post.comments {
        print_comment(comment);
    }
    Ok(())
}

pub async fn comments(ctx: &AppContext, post_id: u64) -> Result<()> {
    ctx.require_user().await?;
    let comments = ctx
        .api()
        .list_comments(post_id)
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to load comments"))?;

    if comments.is_empty() {
        println!("No comments on post #{post_id}.");
        return Ok(());
    }
    for comment in &comments {
        print_comment(comment);
    }
    Ok(())
}

pub async fn comment(ctx: &AppContext, post_id: u64, content: &str) -> Result<()> {
    ctx.require_user().await?;
    let outcome = PostActions::new(ctx.api().clone())
        .add_comment(post_id, content)
        .await
        .map_err(|err| ctx.action_failure(err, "Failed to add comment"))?;
    print_outcome(&outcome);
    Ok(())
}

fn print_comment(comment: &Comment) {
    println!(
        "{} (@{}) · {}",
        comment.user.display_name(),
        comment.user.username,
        format_timestamp(&comment.created_at)
    );
    println!("  {}", rich_text::plain_text(&comment.content));
}

fn print_outcome(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Liked { post_id, toggle } => {
            let verb = if toggle.liked { "Liked" } else { "Unliked" };
            println!("✓ {verb} post #{post_id} ({} likes)", toggle.likes_count);
        }
        ActionOutcome::Shared { post_id, toggle } => {
            let verb = if toggle.shared { "Shared" } else { "Unshared" };
            println!("✓ {verb} post #{post_id} ({} shares)", toggle.shares_count);
        }
        ActionOutcome::Commented { post_id, comment } => {
            println!("✓ Added comment #{} to post #{post_id}", comment.id);
        }
    }
}
