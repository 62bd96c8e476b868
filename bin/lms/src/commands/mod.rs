//! CLI command implementations.

pub mod admin;
pub mod enroll;
pub mod resource;
pub mod server;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use openlms_app::{App, AppConfig};

use crate::config::ClientConfig;

/// Build the application stack for the configured server.
///
/// `validate_interval` overrides how often a running session is
/// re-checked against the server (only `watch` keeps the process
/// alive long enough for that to matter).
pub fn build_app(
    config: &ClientConfig,
    validate_interval: Option<Duration>,
) -> Result<Arc<App>> {
    let server = config.require_server()?;
    let mut app_config = AppConfig::new(server, config.session_path());
    if let Some(interval) = validate_interval {
        app_config.validate_interval = interval;
    }
    Ok(App::new(app_config)?)
}
