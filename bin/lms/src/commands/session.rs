//! Sign-in / sign-out commands.

use anyhow::Result;
use openlms_app::{actions, App, AuthState};
use openlms_client::{token_expiry, SessionStore};

use crate::config::ClientConfig;

/// Sign in and persist the session.
pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    if let Err(e) = actions::auth::login(app, email, password).await {
        anyhow::bail!("Login failed: {}", e);
    }

    let state = app.store().read::<AuthState>();
    if let Some(user) = state.as_ref().and_then(|s| s.user()) {
        println!("Logged in as {} <{}>.", user.name, user.email);
    }
    println!("Session saved to {}.", app.sessions().path().display());
    Ok(())
}

/// Sign out and clear the saved session.
pub async fn logout(app: &App, everywhere: bool) -> Result<()> {
    if app.sessions().snapshot().is_none() {
        println!("Not signed in.");
        return Ok(());
    }

    if everywhere {
        actions::auth::logout_all(app).await?;
        println!("Logged out everywhere.");
    } else {
        actions::auth::logout(app).await?;
        println!("Logged out.");
    }
    Ok(())
}

/// Show the signed-in account, validated against the server.
pub async fn whoami(app: &App) -> Result<()> {
    actions::auth::initialize(app).await?;

    let state = app.store().read::<AuthState>();
    match state.as_ref().and_then(|s| s.user()) {
        Some(user) => {
            println!("Name:    {}", user.name);
            println!("Email:   {}", user.email);
            println!("Role:    {}", user.role);
            println!("Status:  {}", user.status);
        }
        None => {
            println!("Not signed in. Run `lms login`.");
        }
    }
    Ok(())
}

/// Show the local connection and session state without touching the server.
pub fn status(config: &ClientConfig) -> Result<()> {
    let server = if config.server.url.is_empty() { "-" } else { &config.server.url };
    println!("Server:       {}", server);

    let session_path = config.session_path();
    println!("Session file: {}", session_path.display());

    let sessions = match SessionStore::load(&session_path) {
        Ok(s) => s,
        Err(e) => {
            println!("Session:      unreadable ({})", e);
            return Ok(());
        }
    };

    match sessions.snapshot() {
        Some(session) => {
            println!("Signed in as: {} <{}>", session.user.name, session.user.email);
            match token_expiry(&session.access_token) {
                Some(exp) => {
                    let when = chrono::DateTime::from_timestamp(exp, 0)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| exp.to_string());
                    println!("Token:        expires {}", when);
                }
                None => println!("Token:        no local expiry, checked by the server"),
            }
        }
        None => println!("Signed in as: -"),
    }
    Ok(())
}

/// Keep the session alive and report server-side changes until Ctrl+C.
pub async fn watch(app: &App) -> Result<()> {
    actions::auth::initialize(app).await?;

    let state = app.store().read::<AuthState>();
    let Some(user) = state.as_ref().and_then(|s| s.user()) else {
        anyhow::bail!("Not signed in. Run `lms login`.");
    };
    println!(
        "Watching session for {} <{}>. Press Ctrl+C to stop.",
        user.name, user.email
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let sub = app.store().subscribe("", move |path, value| {
        if let Some(state) = value.downcast_ref::<AuthState>() {
            let _ = tx.send(state.clone());
        } else {
            println!("{} updated", path);
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down.");
                break;
            }
            Some(state) = rx.recv() => match state {
                AuthState::Authenticated { user, .. } => {
                    println!("session refreshed for {}", user.email);
                }
                AuthState::Unauthenticated { .. } => {
                    println!("Session ended by the server.");
                    break;
                }
                _ => {}
            },
        }
    }

    app.store().unsubscribe(sub);
    app.shutdown();
    Ok(())
}
