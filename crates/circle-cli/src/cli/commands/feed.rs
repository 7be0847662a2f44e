//! Feed command handlers.

use anyhow::{Context, Result};
use circle_core::config::Config;
use circle_core::feed::{self, SortMode};
use circle_core::page::{FeedPage, FeedSource};
use circle_core::rich_text;
use circle_core::types::Post;
use comfy_table::{ContentArrangement, Table};

use super::AppContext;

const CONTENT_PREVIEW_CHARS: usize = 60;

pub struct FeedArgs {
    pub query: Option<String>,
    pub sort: Option<SortMode>,
    pub user: Option<u64>,
    pub save_sort: bool,
}

pub async fn list(ctx: &AppContext, args: FeedArgs) -> Result<()> {
    ctx.require_user().await?;

    let mode = args.sort.unwrap_or(ctx.config.default_sort);
    if args.save_sort {
        Config::save_default_sort(mode).context("save default sort")?;
    }
    if mode.is_identity() {
        eprintln!(
            "Note: following shows posts in server order; follow lists are not available yet."
        );
    }

    let source = args.user.map_or(FeedSource::All, FeedSource::User);
    let posts = source
        .fetch(ctx.api())
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to load feed"))?;

    let mut page = FeedPage::new(mode);
    page.load(posts);
    if let Some(query) = args.query {
        page.set_query(query);
    }

    if page.displayed().is_empty() {
        if page.source().is_empty() {
            println!("No posts yet.");
        } else {
            println!("No posts match \"{}\".", page.filter().query.trim());
        }
        return Ok(());
    }
    println!("{}", render_posts(page.displayed()));
    Ok(())
}

pub async fn recent(ctx: &AppContext) -> Result<()> {
    ctx.require_user().await?;

    let mut posts = FeedSource::Recent
        .fetch(ctx.api())
        .await
        .map_err(|err| ctx.api_failure(err, "Failed to load recent posts"))?;
    posts.truncate(ctx.config.recent_posts_limit);

    if posts.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }
    for post in &posts {
        println!(
            "#{} {} · {}",
            post.id,
            post.author.display_name(),
            format_timestamp(&post.created_at)
        );
        println!("  {}", preview(&post.content));
    }
    Ok(())
}

pub fn sorts(ctx: &AppContext) {
    let mut table = Table::new();
    table.set_header(vec!["Mode", "Description"]);
    for mode in SortMode::all() {
        let name = if *mode == ctx.config.default_sort {
            format!("{mode} (default)")
        } else {
            mode.to_string()
        };
        table.add_row(vec![name, mode.description().to_string()]);
    }
    println!("{table}");
}

/// Renders posts as a table.
pub fn render_posts(posts: &[Post]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID", "Author", "Posted", "Content", "Likes", "Comments", "Shares",
    ]);

    for post in posts {
        table.add_row(vec![
            post.id.to_string(),
            format!("{} (@{})", post.author.display_name(), post.author.username),
            format_timestamp(&post.created_at),
            preview(&post.content),
            marked(post.likes_count, post.is_liked),
            post.comments_count.to_string(),
            marked(post.shares_count, post.is_shared),
        ]);
    }

    table.to_string()
}

/// Formats a server timestamp for display, or `-` when it cannot be read.
pub fn format_timestamp(raw: &str) -> String {
    feed::created_at_key(raw).map_or_else(
        || "-".to_string(),
        |parsed| parsed.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn preview(markup: &str) -> String {
    let text = rich_text::plain_text(markup);
    if text.chars().count() <= CONTENT_PREVIEW_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(CONTENT_PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}

fn marked(count: u64, mine: bool) -> String {
    if mine {
        format!("{count} *")
    } else {
        count.to_string()
    }
}
