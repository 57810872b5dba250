//! Anteroom HTTP server.
//!
//! The backend behind the marketing site: captures waitlist leads into a
//! Google Sheet and hands verified email links off to the tenant application
//! with a freshly minted session cookie. Two leaf endpoints, no shared state
//! between requests beyond the connection pool.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod sheets;
pub mod state;
