// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these,
// never on the human-readable message string.

/// Stable error code constants.
pub mod error_code {
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
}

// ── ApiError ────────────────────────────────────────────────────────

/// Client-side API error.
///
/// - `Auth`: the backend rejected login credentials; shown to the user,
///   never retried.
/// - `SessionExpired`: the session is terminally gone (refresh rejected,
///   account blocked/deleted/role-changed). By the time a caller sees
///   this, persisted state is already cleared and logout signaled.
/// - `Server`: any other non-success response; propagates to the
///   owning feature slice, no retry, no session impact.
/// - `Network` / `Decode`: transport and body failures, surfaced as-is.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("please sign in again")]
    SessionExpired(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Auth(_) => error_code::AUTH_FAILED,
            ApiError::SessionExpired(_) => error_code::SESSION_EXPIRED,
            ApiError::Server { .. } => error_code::SERVER_ERROR,
            ApiError::Network(_) => error_code::NETWORK_ERROR,
            ApiError::Decode(_) => error_code::DECODE_ERROR,
        }
    }

    /// True when the session is gone and the caller must not retry.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }
}
