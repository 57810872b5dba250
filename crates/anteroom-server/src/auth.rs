//! Token layer — email verification tokens and session tokens.
//!
//! Both are HS256 JWTs with separate secrets. Email tokens are issued by the
//! out-of-scope mailer and only verified here; session tokens are minted
//! fresh on every successful verification with a fixed 7-day validity.
//! There is no server-side revocation — a session is valid exactly as long
//! as its signature and expiry hold.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, TenantUser};

/// Fixed session validity.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Token layer error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("user record carries an unknown role: {0}")]
    UnknownRole(String),
}

/// Claims carried by an email verification token.
///
/// `tenant` is optional in the wire format — older mailer deployments signed
/// tokens without it and relied on the query parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaims {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Claims carried by a session token (the `auth_token` cookie).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub user_id: Uuid,
    pub tenant_path: String,
    pub role: Role,
    pub authenticated: bool,
    /// External application domain the session is intended for.
    pub domain: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verify an email token's signature and expiry and return its claims.
///
/// # Errors
///
/// Returns `AuthError::Jwt` if the token is malformed, the signature does
/// not verify, or the token has expired.
pub fn verify_email_token(token: &str, secret: &str) -> Result<EmailClaims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<EmailClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Mint a session token for a verified user.
///
/// The stored role string is parsed into [`Role`] here rather than copied
/// through — a session must not embed a role claim the application does not
/// recognize.
///
/// # Errors
///
/// Returns `AuthError::UnknownRole` if the stored role is not a known
/// [`Role`], and `AuthError::Jwt` if signing fails.
pub fn issue_session_token(
    user: &TenantUser,
    tenant_path: &str,
    app_domain: &str,
    secret: &str,
) -> Result<String, AuthError> {
    let role: Role = user.role.parse().map_err(AuthError::UnknownRole)?;

    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        email: user.email.clone(),
        user_id: user.id,
        tenant_path: tenant_path.to_owned(),
        role,
        authenticated: true,
        domain: app_domain.to_owned(),
        iat: now,
        exp: now + SESSION_TTL_DAYS * 24 * 60 * 60,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
