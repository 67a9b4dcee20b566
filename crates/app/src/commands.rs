//! Command implementations.
//!
//! Each command writes its user-facing output to `out`; diagnostics go
//! through `tracing`.

use std::io::Write;
use std::sync::Arc;

use portcullis_application::{RefreshOutcome, RefreshTask};
use portcullis_domain::{CallbackOutcome, SessionToken};
use portcullis_infrastructure::ApiError;
use tracing::{info, warn};

use crate::cli::Command;
use crate::context::AppContext;
use crate::error::AppResult;

/// Runs `command` against `ctx`.
///
/// # Errors
///
/// Returns the command's failure; see the individual commands.
pub async fn run(command: Command, ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    match command {
        Command::Login {
            client,
            redirect_uri,
        } => login(ctx, client.as_deref(), redirect_uri.as_deref(), out).await,
        Command::Callback { redirect } => callback(ctx, &redirect, out).await,
        Command::Status => status(ctx, out),
        Command::Whoami => whoami(ctx, out).await,
        Command::Refresh => refresh(ctx, out).await,
        Command::Watch => watch(ctx, out).await,
        Command::Logout => logout(ctx, out).await,
    }
}

async fn login(
    ctx: &AppContext,
    client: Option<&str>,
    redirect_uri: Option<&str>,
    out: &mut dyn Write,
) -> AppResult<()> {
    let redirect = ctx.flow.begin_login(client, redirect_uri).await?;
    writeln!(out, "Open this URL to sign in:")?;
    writeln!(out, "{}", redirect.url)?;
    Ok(())
}

async fn callback(ctx: &AppContext, redirect: &str, out: &mut dyn Write) -> AppResult<()> {
    match ctx.flow.complete_login(redirect) {
        Ok(CallbackOutcome::Authenticated(token)) => {
            writeln!(out, "Authenticated as {}", describe(&token))?;
            Ok(())
        }
        Ok(CallbackOutcome::AlreadyProcessed) => {
            writeln!(out, "Callback already processed")?;
            Ok(())
        }
        Err(e) if e.requires_login() => {
            writeln!(out, "Authentication failed: {e}")?;
            let retry = ctx.flow.retry_login(None, None).await?;
            writeln!(out, "Start over at:")?;
            writeln!(out, "{}", retry.url)?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn status(ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    let manager = &ctx.manager;
    writeln!(out, "{}", manager.auth_state().message())?;
    writeln!(out, "Client: {}", manager.client_key())?;
    writeln!(out, "Token: {}", manager.status().display_message())?;
    if let Some(token) = manager.get_token() {
        writeln!(out, "Subject: {}", describe(&token))?;
    }
    Ok(())
}

async fn whoami(ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    match ctx.api.current_user().await {
        Ok(user) => {
            let pretty = serde_json::to_string_pretty(&user).unwrap_or_else(|_| user.to_string());
            writeln!(out, "{pretty}")?;
            Ok(())
        }
        Err(ApiError::Unauthorized) => {
            warn!("session rejected by server, clearing token");
            ctx.manager.clear_token()?;
            writeln!(out, "Session expired. Run `portcullis login` to sign in again.")?;
            Err(ApiError::Unauthorized.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn refresh(ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    match ctx.manager.refresh_tick().await {
        RefreshOutcome::NoToken => writeln!(out, "Not authenticated")?,
        RefreshOutcome::StillFresh { seconds_remaining } => {
            writeln!(out, "Token still fresh ({seconds_remaining}s remaining)")?;
        }
        RefreshOutcome::InFlight => writeln!(out, "A refresh is already running")?,
        RefreshOutcome::Refreshed(token) => {
            writeln!(out, "Token refreshed ({})", ctx.manager.status().display_message())?;
            info!(token = %token.preview(), "token refreshed on demand");
        }
        RefreshOutcome::Failed(e) => {
            writeln!(out, "Refresh failed: {e}")?;
            return Err(e.into());
        }
    }
    Ok(())
}

async fn watch(ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    let subscription = ctx.manager.add_listener(|new, _old| match new {
        Some(token) => info!(token = %token.preview(), "token updated"),
        None => info!("token cleared"),
    });
    let task = RefreshTask::spawn(Arc::clone(&ctx.manager), ctx.settings.refresh_interval());
    writeln!(
        out,
        "Watching session every {}s; press Ctrl-C to stop",
        ctx.settings.refresh_interval_secs
    )?;
    out.flush()?;

    let signal = tokio::signal::ctrl_c().await;
    task.shutdown().await;
    subscription.unsubscribe();
    signal?;
    writeln!(out, "Stopped")?;
    Ok(())
}

async fn logout(ctx: &AppContext, out: &mut dyn Write) -> AppResult<()> {
    ctx.manager.logout().await?;
    writeln!(out, "Signed out")?;
    Ok(())
}

fn describe(token: &SessionToken) -> String {
    token
        .claims()
        .ok()
        .and_then(|claims| claims.subject().map(str::to_string))
        .unwrap_or_else(|| token.preview())
}
