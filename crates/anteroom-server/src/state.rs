//! Shared application state.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! handlers via `Arc`. Requests share nothing else — each one operates on
//! its own user record and its own pool connection.

use sqlx::PgPool;

use crate::config::Config;
use crate::sheets::SheetsClient;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Server configuration (secrets, URLs, cookie scope).
    pub config: Config,
    /// `PostgreSQL` connection pool for the tenant user store.
    pub pool: PgPool,
    /// Spreadsheet client (None when credentials are not configured).
    pub sheets: Option<SheetsClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
