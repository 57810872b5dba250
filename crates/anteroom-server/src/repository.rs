//! User store — `PostgreSQL` queries for tenant users.
//!
//! Every function takes a `&mut PgConnection` (the verification pipeline
//! acquires one connection per request and threads it through) and returns
//! `Result<T, UserStoreError>`. Queries use parameterized statements.
//!
//! Known race, deliberately unguarded: two simultaneous first-time
//! verifications for the same email can double-create a user. The schema
//! carries no unique `(tenant, email)` constraint to match the source
//! system's behavior.

use sqlx::{Acquire, PgConnection};
use uuid::Uuid;

use crate::models::{Role, TenantUser};

/// User store error.
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user store error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Find a user by email within a tenant scope.
///
/// # Errors
///
/// Returns `UserStoreError::Database` on query failure.
pub async fn find_user_by_email(
    conn: &mut PgConnection,
    tenant: &str,
    email: &str,
) -> Result<Option<TenantUser>, UserStoreError> {
    let user = sqlx::query_as::<_, TenantUser>(
        "SELECT * FROM tenant_users WHERE tenant = $1 AND email = $2",
    )
    .bind(tenant)
    .bind(email)
    .fetch_optional(conn)
    .await?;

    Ok(user)
}

/// Create a user in a tenant, assigning the role via [`Role::assign`]:
/// the first user in the tenant becomes the owner.
///
/// The count and the insert run in one transaction so the policy sees a
/// consistent view of the tenant.
///
/// # Errors
///
/// Returns `UserStoreError::Database` on query failure.
pub async fn create_user(
    conn: &mut PgConnection,
    tenant: &str,
    email: &str,
    tenant_path: &str,
) -> Result<TenantUser, UserStoreError> {
    let mut tx = conn.begin().await?;

    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tenant_users WHERE tenant = $1")
            .bind(tenant)
            .fetch_one(&mut *tx)
            .await?;

    let role = Role::assign(existing);

    let user = sqlx::query_as::<_, TenantUser>(
        r"INSERT INTO tenant_users (tenant, email, tenant_path, role)
          VALUES ($1, $2, $3, $4)
          RETURNING *",
    )
    .bind(tenant)
    .bind(email)
    .bind(tenant_path)
    .bind(role.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(user)
}

/// Refresh `last_login_at` and backfill `tenant_path` where it is missing.
///
/// # Errors
///
/// Returns `UserStoreError::Database` on query failure, including when the
/// user no longer exists.
pub async fn record_login(
    conn: &mut PgConnection,
    user_id: Uuid,
    tenant_path: &str,
) -> Result<TenantUser, UserStoreError> {
    let user = sqlx::query_as::<_, TenantUser>(
        r"UPDATE tenant_users
          SET last_login_at = now(),
              tenant_path = COALESCE(tenant_path, $2)
          WHERE id = $1
          RETURNING *",
    )
    .bind(user_id)
    .bind(tenant_path)
    .fetch_one(conn)
    .await?;

    Ok(user)
}

/// Resolve the user record for a verified login: look up by email within the
/// tenant, create on first sight, and refresh the login timestamp.
///
/// # Errors
///
/// Returns `UserStoreError::Database` on query failure.
pub async fn provision_login(
    conn: &mut PgConnection,
    tenant: &str,
    email: &str,
    tenant_path: &str,
) -> Result<TenantUser, UserStoreError> {
    match find_user_by_email(&mut *conn, tenant, email).await? {
        Some(existing) => record_login(conn, existing.id, tenant_path).await,
        // created_at and last_login_at both default to now() on insert.
        None => create_user(conn, tenant, email, tenant_path).await,
    }
}
