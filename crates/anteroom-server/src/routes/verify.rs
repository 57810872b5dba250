//! Email verification route.
//!
//! `GET /api/verify-email` — the tenant login hand-off. A linear pipeline
//! that short-circuits at the first failure; every failure is a redirect
//! carrying an error code, never an error response. Before the tenant is
//! resolved, errors land on the marketing site's generic error page; after
//! that, on the tenant's own.
//!
//! On success the handler mints a 7-day session token, sets it as a
//! parent-domain cookie and redirects to the tenant application.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::auth::{self, EmailClaims};
use crate::repository;
use crate::state::AppState;

/// Cookie the session token is stored in.
const SESSION_COOKIE: &str = "auth_token";

/// Query parameters of a verification link.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
    pub tenant: Option<String>,
}

/// `GET /api/verify-email` — verify an email token and hand off to the
/// tenant application.
///
/// The query is extracted fallibly: even a query string that defeats
/// deserialization (e.g. a duplicated key) degrades to a redirect, never a
/// raw error response.
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable verification query");
            let destination = base_error_url(&state.config.public_base_url, "server-error");
            return Redirect::temporary(&destination).into_response();
        }
    };

    match login_pipeline(&state, jar, query).await {
        Ok(resp) => resp,
        Err(destination) => Redirect::temporary(&destination).into_response(),
    }
}

/// The verification pipeline. Each stage either advances or terminates with
/// a redirect destination; there is no branching back and no retry.
async fn login_pipeline(
    state: &AppState,
    jar: CookieJar,
    query: VerifyQuery,
) -> Result<Response, String> {
    let base = &state.config.public_base_url;

    // 1. The token parameter is mandatory.
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        tracing::warn!("verification request without token");
        return Err(base_error_url(base, "invalid-token"));
    };

    // 2. Signature and expiry.
    let claims: EmailClaims =
        match auth::verify_email_token(&token, &state.config.email_token_secret) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "email token rejected");
                return Err(base_error_url(base, "invalid-token"));
            }
        };

    // 3–5. Resolve the tenant and confirm it matches the token's binding.
    let tenant = match resolve_tenant(query.tenant.as_deref(), claims.tenant.as_deref()) {
        Ok(tenant) => tenant,
        Err(e) => {
            tracing::warn!(error = %e, "tenant resolution failed");
            return Err(base_error_url(base, "invalid-tenant"));
        }
    };

    // Destinations are tenant-aware from here on.
    let tenant_path = format!("/{tenant}");

    // 6. Tenant-scoped database connection.
    let mut conn = match state.pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(tenant = %tenant, error = %e, "database unreachable");
            return Err(tenant_error_url(base, &tenant, "database-error"));
        }
    };

    // 7. Resolve or create the user and refresh the login timestamp.
    let user =
        match repository::provision_login(&mut *conn, &tenant, &claims.email, &tenant_path).await
        {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "user provisioning failed");
                return Err(tenant_error_url(base, &tenant, "user-error"));
            }
        };

    // 8. Mint the session token.
    let session = match auth::issue_session_token(
        &user,
        &tenant_path,
        &state.config.app_domain,
        &state.config.session_secret,
    ) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(tenant = %tenant, error = %e, "session issuance failed");
            return Err(tenant_error_url(base, &tenant, "session-error"));
        }
    };

    tracing::info!(tenant = %tenant, role = %user.role, "login verified");

    // 9–10. Cookie plus redirect into the tenant application.
    let cookie = session_cookie(session, &state.config.cookie_domain);
    let destination = app_landing_url(&state.config.app_domain, &tenant);
    Ok((jar.add(cookie), Redirect::temporary(&destination)).into_response())
}

/// Tenant resolution error.
#[derive(Debug, thiserror::Error)]
enum TenantError {
    #[error("no tenant in request or token")]
    Missing,
    #[error("tenant does not match the token's binding")]
    Mismatch,
}

/// Resolve the effective tenant from the query parameter and the token's
/// embedded tenant.
///
/// The query value is adopted only when the token confirms it — a token
/// issued for tenant A must not be replayable against tenant B's path. A
/// missing query value falls back to the token's tenant.
fn resolve_tenant(
    requested: Option<&str>,
    embedded: Option<&str>,
) -> Result<String, TenantError> {
    let requested = requested.filter(|t| !t.is_empty());
    let embedded = embedded.filter(|t| !t.is_empty());

    match (requested, embedded) {
        (None, None) => Err(TenantError::Missing),
        (None, Some(embedded)) => Ok(embedded.to_owned()),
        // Nothing in the token to confirm the binding against.
        (Some(_), None) => Err(TenantError::Mismatch),
        (Some(requested), Some(embedded)) if requested == embedded => {
            Ok(requested.to_owned())
        }
        (Some(_), Some(_)) => Err(TenantError::Mismatch),
    }
}

/// Error page on the marketing site, used before the tenant is known.
fn base_error_url(base_url: &str, code: &str) -> String {
    format!("{base_url}/login-error?error={code}")
}

/// The tenant's own error page, used once the tenant is resolved.
fn tenant_error_url(base_url: &str, tenant: &str, code: &str) -> String {
    format!(
        "{base_url}/{}/login-error?error={code}",
        urlencoding::encode(tenant)
    )
}

/// Landing path inside the external tenant application.
fn app_landing_url(app_domain: &str, tenant: &str) -> String {
    format!("https://{app_domain}/{}/app", urlencoding::encode(tenant))
}

/// Build the cross-domain session cookie.
///
/// Scoped to the parent domain so both the marketing site and the tenant
/// application can read it; `SameSite=None` because the final redirect
/// lands on a different domain.
fn session_cookie(session_token: String, cookie_domain: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_token))
        .domain(cookie_domain.to_owned())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::days(auth::SESSION_TTL_DAYS))
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ── resolve_tenant ───────────────────────────────────────────────

    #[test]
    fn matching_tenant_is_accepted() {
        assert_eq!(
            resolve_tenant(Some("acme"), Some("acme")).unwrap(),
            "acme"
        );
    }

    #[test]
    fn missing_query_tenant_adopts_token_tenant() {
        assert_eq!(resolve_tenant(None, Some("acme")).unwrap(), "acme");
    }

    #[test]
    fn mismatched_tenant_is_rejected() {
        assert!(matches!(
            resolve_tenant(Some("other"), Some("acme")),
            Err(TenantError::Mismatch)
        ));
    }

    #[test]
    fn unconfirmable_tenant_is_rejected() {
        assert!(matches!(
            resolve_tenant(Some("acme"), None),
            Err(TenantError::Mismatch)
        ));
    }

    #[test]
    fn absent_tenant_everywhere_is_missing() {
        assert!(matches!(
            resolve_tenant(None, None),
            Err(TenantError::Missing)
        ));
        assert!(matches!(
            resolve_tenant(Some(""), Some("")),
            Err(TenantError::Missing)
        ));
    }

    // ── Redirect destinations ────────────────────────────────────────

    #[test]
    fn error_urls_carry_the_code() {
        assert_eq!(
            base_error_url("https://example.com", "invalid-token"),
            "https://example.com/login-error?error=invalid-token"
        );
        assert_eq!(
            tenant_error_url("https://example.com", "acme", "database-error"),
            "https://example.com/acme/login-error?error=database-error"
        );
    }

    #[test]
    fn landing_url_is_tenant_scoped() {
        assert_eq!(
            app_landing_url("app.example.com", "acme"),
            "https://app.example.com/acme/app"
        );
    }

    #[test]
    fn tenant_is_url_encoded_in_destinations() {
        assert_eq!(
            tenant_error_url("https://example.com", "a b", "user-error"),
            "https://example.com/a%20b/login-error?error=user-error"
        );
    }

    // ── Session cookie ───────────────────────────────────────────────

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok".to_owned(), ".example.com");
        assert_eq!(cookie.name(), "auth_token");
        assert_eq!(cookie.value(), "tok");
        // The cookie crate strips the leading dot in the getter.
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }
}
