//! Server connection commands.

use std::path::Path;

use anyhow::Result;

use crate::config::ClientConfig;

/// Point the CLI at a server.
pub fn set(url: &str, session_file: Option<&str>, config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;

    config.server.url = url.trim_end_matches('/').to_string();
    if let Some(path) = session_file {
        config.session.file = path.to_string();
    }
    config.save(config_path)?;

    println!("Server set to {}.", config.server.url);
    Ok(())
}

/// Show the configured connection.
pub fn show(config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(config_path)?;

    let server = if config.server.url.is_empty() { "-" } else { &config.server.url };
    println!("Config file:  {}", config_path.display());
    println!("Server:       {}", server);
    println!("Session file: {}", config.session_path().display());
    Ok(())
}
