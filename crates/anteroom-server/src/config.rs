//! Server configuration for Anteroom.
//!
//! Loads configuration from environment variables. Signing secrets and the
//! database URL are required with no embedded defaults — startup fails if
//! they are absent. Spreadsheet credentials are optional at startup; without
//! them the waitlist endpoint rejects submissions with a configuration error.

use std::net::SocketAddr;

use anyhow::{bail, Context};

use crate::sheets::SheetsConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// HS256 secret the mailer signs email verification tokens with.
    pub email_token_secret: String,
    /// HS256 secret session tokens are signed with.
    pub session_secret: String,
    /// Public base URL of the marketing site (error pages live under it).
    pub public_base_url: String,
    /// Domain of the external tenant application (redirect target).
    pub app_domain: String,
    /// Domain the session cookie is scoped to (parent of `app_domain`).
    pub cookie_domain: String,
    /// Google Sheets credentials for the waitlist endpoint (optional).
    pub sheets: Option<SheetsConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (Railway convention, binds to `0.0.0.0`)
    /// - `ANTEROOM_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8080`)
    /// - `DATABASE_URL` — `PostgreSQL` connection string (required)
    /// - `ANTEROOM_LOG_LEVEL` — log filter (default: `info`)
    /// - `EMAIL_TOKEN_SECRET` — email token signing secret (required)
    /// - `SESSION_SECRET` — session token signing secret (required)
    /// - `PUBLIC_BASE_URL` — marketing site base URL (required)
    /// - `APP_DOMAIN` — tenant application domain (required)
    /// - `COOKIE_DOMAIN` — cookie scope (default: derived parent of `APP_DOMAIN`)
    /// - `SHEETS_SPREADSHEET_ID`, `SHEETS_SERVICE_ACCOUNT_EMAIL`,
    ///   `SHEETS_PRIVATE_KEY` — waitlist spreadsheet credentials (optional,
    ///   all three or none)
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is missing or empty, or if
    /// spreadsheet credentials are only partially set.
    pub fn from_env() -> anyhow::Result<Self> {
        // Priority: ANTEROOM_BIND_ADDR > PORT (Railway) > default 127.0.0.1:8080
        let bind_addr = if let Ok(addr) = std::env::var("ANTEROOM_BIND_ADDR") {
            addr.parse()
                .with_context(|| format!("invalid ANTEROOM_BIND_ADDR: {addr}"))?
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str
                .parse()
                .with_context(|| format!("invalid PORT: {port_str}"))?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8080))
        };

        let database_url = require("DATABASE_URL")?;
        let email_token_secret = require("EMAIL_TOKEN_SECRET")?;
        let session_secret = require("SESSION_SECRET")?;
        let public_base_url = require("PUBLIC_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let app_domain = require("APP_DOMAIN")?;

        let cookie_domain = std::env::var("COOKIE_DOMAIN")
            .unwrap_or_else(|_| parent_domain(&app_domain));

        let log_level =
            std::env::var("ANTEROOM_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let sheets = sheets_from_env()?;

        Ok(Self {
            bind_addr,
            database_url,
            log_level,
            email_token_secret,
            session_secret,
            public_base_url,
            app_domain,
            cookie_domain,
            sheets,
        })
    }
}

/// Read a required environment variable, rejecting empty values.
fn require(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => bail!("required environment variable {name} is not set"),
    }
}

/// Load spreadsheet credentials if configured.
///
/// All three variables must be set together; a partial set is a
/// misconfiguration and fails startup rather than failing silently
/// per request.
fn sheets_from_env() -> anyhow::Result<Option<SheetsConfig>> {
    let spreadsheet_id = std::env::var("SHEETS_SPREADSHEET_ID").ok();
    let service_account_email = std::env::var("SHEETS_SERVICE_ACCOUNT_EMAIL").ok();
    let private_key = std::env::var("SHEETS_PRIVATE_KEY").ok();

    match (spreadsheet_id, service_account_email, private_key) {
        (Some(spreadsheet_id), Some(service_account_email), Some(private_key))
            if !spreadsheet_id.is_empty()
                && !service_account_email.is_empty()
                && !private_key.is_empty() =>
        {
            Ok(Some(SheetsConfig {
                spreadsheet_id,
                service_account_email,
                // Deployment platforms store the PEM with escaped newlines.
                private_key_pem: private_key.replace("\\n", "\n"),
            }))
        }
        (None, None, None) => Ok(None),
        _ => bail!(
            "SHEETS_SPREADSHEET_ID, SHEETS_SERVICE_ACCOUNT_EMAIL and SHEETS_PRIVATE_KEY \
             must be set together"
        ),
    }
}

/// Derive the parent domain the session cookie is scoped to.
///
/// The cookie must be readable by both the marketing site and the tenant
/// application, so it is set one label above the app domain:
/// `app.example.com` → `.example.com`. A bare two-label domain is kept
/// as-is (with a leading dot).
fn parent_domain(app_domain: &str) -> String {
    let labels: Vec<&str> = app_domain.split('.').collect();
    if labels.len() > 2 {
        format!(".{}", labels[1..].join("."))
    } else {
        format!(".{app_domain}")
    }
}
