//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use circle_core::config;
use circle_core::feed::SortMode;
use circle_core::logging;
use clap::Parser;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "circle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for the circle social network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Password input shared by login and register.
#[derive(clap::Args, Debug, Clone, Default)]
struct PasswordArgs {
    /// Password (read from stdin when omitted)
    #[arg(long, env = "CIRCLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with a username and password
    Login {
        #[arg(short, long)]
        username: String,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Forget the stored session
    Logout {
        /// Also invalidate the token on the server
        #[arg(long)]
        revoke: bool,
    },

    /// Show the logged-in user
    Whoami,

    /// List posts, filtered and sorted
    Feed {
        /// Case-insensitive search over content and author names
        #[arg(short, long)]
        query: Option<String>,

        /// Ordering: recent, popular, trending, following
        #[arg(short, long, value_name = "MODE")]
        sort: Option<SortMode>,

        /// Show only posts by this user
        #[arg(long, value_name = "USER_ID")]
        user: Option<u64>,

        /// Remember --sort as the default ordering
        #[arg(long, requires = "sort")]
        save_sort: bool,
    },

    /// Show the most recent posts
    Recent,

    /// List the available feed orderings
    Sorts,

    /// Show one post with its comments
    Show {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },

    /// Publish a post
    Post {
        /// Post text (may contain inline markup)
        content: String,

        /// Attach an image
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        italic: bool,

        #[arg(long)]
        underline: bool,
    },

    /// Toggle your like on a post
    Like {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },

    /// Toggle your share of a post
    Share {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },

    /// List comments on a post
    Comments {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },

    /// Comment on a post
    Comment {
        #[arg(value_name = "POST_ID")]
        id: u64,

        content: String,
    },

    /// View or edit profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Show a user's profile and posts
    Show {
        #[arg(value_name = "USER_ID")]
        user_id: u64,
    },
    /// Edit your own profile; omitted fields keep their current value
    Edit {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        bio: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Birth date as YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        birth_date: Option<String>,

        #[arg(long, value_name = "PATH")]
        avatar: Option<PathBuf>,

        #[arg(long, value_name = "PATH")]
        cover: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a fresh config generated from defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config commands must work even when the config file is broken.
    let command = match cli.command {
        Commands::Config { command } => return config_command(command),
        command => command,
    };

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log).context("init logging")?;
    let ctx = AppContext::new(config)?;

    match command {
        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &username, password.password).await
        }
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            commands::auth::register(
                &ctx,
                commands::auth::RegisterArgs {
                    username,
                    email,
                    first_name,
                    last_name,
                    password: password.password,
                },
            )
            .await
        }
        Commands::Logout { revoke } => commands::auth::logout(&ctx, revoke).await,
        Commands::Whoami => commands::auth::whoami(&ctx).await,

        Commands::Feed {
            query,
            sort,
            user,
            save_sort,
        } => {
            commands::feed::list(
                &ctx,
                commands::feed::FeedArgs {
                    query,
                    sort,
                    user,
                    save_sort,
                },
            )
            .await
        }
        Commands::Recent => commands::feed::recent(&ctx).await,
        Commands::Sorts => {
            commands::feed::sorts(&ctx);
            Ok(())
        }
        Commands::Show { id } => commands::posts::show(&ctx, id).await,

        Commands::Post {
            content,
            image,
            bold,
            italic,
            underline,
        } => {
            commands::posts::create(
                &ctx,
                commands::posts::PostArgs {
                    content,
                    image,
                    bold,
                    italic,
                    underline,
                },
            )
            .await
        }
        Commands::Like { id } => commands::posts::like(&ctx, id).await,
        Commands::Share { id } => commands::posts::share(&ctx, id).await,
        Commands::Comments { id } => commands::posts::comments(&ctx, id).await,
        Commands::Comment { id, content } => commands::posts::comment(&ctx, id, &content).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Show { user_id } => commands::profile::show(&ctx, user_id).await,
            ProfileCommands::Edit {
                first_name,
                last_name,
                bio,
                location,
                birth_date,
                avatar,
                cover,
            } => {
                commands::profile::edit(
                    &ctx,
                    commands::profile::EditArgs {
                        first_name,
                        last_name,
                        bio,
                        location,
                        birth_date,
                        avatar,
                        cover,
                    },
                )
                .await
            }
        },

        Commands::Config { command } => config_command(command),
    }
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::Generate => commands::config::generate(),
    }
}
