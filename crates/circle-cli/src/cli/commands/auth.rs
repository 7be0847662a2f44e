//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, anyhow};
use circle_core::session::SessionError;
use circle_core::token_store::token_preview;
use circle_core::types::{RegisterRequest, User};

use super::AppContext;

pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

pub async fn login(ctx: &AppContext, username: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password)?;
    // Settle any stored session first; login replaces it.
    ctx.session.hydrate().await;

    let user = ctx
        .session
        .login(username, &password)
        .await
        .map_err(|err| session_failure(&err, "Login failed"))?;
    print_logged_in(ctx, &user);
    Ok(())
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let password = resolve_password(args.password)?;
    ctx.session.hydrate().await;

    let request = RegisterRequest {
        username: args.username,
        email: args.email,
        password,
        first_name: args.first_name.unwrap_or_default(),
        last_name: args.last_name.unwrap_or_default(),
    };
    let user = ctx
        .session
        .register(&request)
        .await
        .map_err(|err| session_failure(&err, "Registration failed"))?;
    print_logged_in(ctx, &user);
    Ok(())
}

pub async fn logout(ctx: &AppContext, revoke: bool) -> Result<()> {
    let stored = ctx.tokens.load().unwrap_or_else(|err| {
        tracing::warn!(error = %format!("{err:#}"), "unreadable session file");
        None
    });
    let Some(token) = stored else {
        ctx.session.logout().context("clear session")?;
        println!("Not logged in (no session found).");
        return Ok(());
    };

    if revoke {
        ctx.api().set_token(token.as_str());
        match ctx.api().revoke_token().await {
            Ok(()) => println!("Token revoked on the server."),
            Err(err) => eprintln!("Warning: could not revoke token: {}", err.user_message()),
        }
    }

    ctx.session.logout().context("clear session")?;
    println!("✓ Logged out (token: {})", token_preview(&token));
    println!("  Session removed from: {}", ctx.tokens.path().display());
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let user = ctx.require_user().await?;
    println!("{} (@{})", user.display_name(), user.username);
    println!("  id: {}", user.id);
    if !user.email.is_empty() {
        println!("  email: {}", user.email);
    }
    if let Some(joined) = user.date_joined.as_deref() {
        println!("  joined: {joined}");
    }
    Ok(())
}

fn print_logged_in(ctx: &AppContext, user: &User) {
    println!("✓ Logged in as {} (@{})", user.display_name(), user.username);
    println!("  Session saved to: {}", ctx.tokens.path().display());
}

fn session_failure(err: &SessionError, what: &str) -> anyhow::Error {
    anyhow!("{}", err.user_message()).context(what.to_string())
}

/// Uses the given password, or reads one line from stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Password: ");
        io::stdout().flush()?;
    }
    let mut input = String::new();
    stdin
        .lock()
        .read_line(&mut input)
        .context("read password from stdin")?;
    let password = input.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}
