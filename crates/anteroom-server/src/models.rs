//! Data models.
//!
//! Domain types for tenant users and roles. All IDs are UUIDs. A user is
//! scoped to a tenant — the same email in two tenants is two rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a tenant user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

impl Role {
    /// Role-assignment policy for user creation: the first user created in a
    /// tenant becomes the owner, everyone after that a member.
    #[must_use]
    pub const fn assign(existing_users: i64) -> Self {
        if existing_users == 0 {
            Self::Owner
        } else {
            Self::Member
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user within a tenant scope.
///
/// Created on first successful email verification; `last_login_at` is
/// refreshed on every subsequent verification. `tenant_path` is backfilled
/// for rows created before the column existed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantUser {
    pub id: Uuid,
    pub tenant: String,
    pub email: String,
    pub tenant_path: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    // ── Role::assign ─────────────────────────────────────────────────

    #[test]
    fn first_user_in_tenant_becomes_owner() {
        assert_eq!(Role::assign(0), Role::Owner);
    }

    #[test]
    fn subsequent_users_become_members() {
        assert_eq!(Role::assign(1), Role::Member);
        assert_eq!(Role::assign(42), Role::Member);
    }

    // ── Role round-trip ──────────────────────────────────────────────

    #[test]
    fn role_string_round_trip() {
        assert_eq!(Role::from_str("owner").unwrap(), Role::Owner);
        assert_eq!(Role::from_str("Member").unwrap(), Role::Member);
        assert_eq!(Role::Owner.to_string(), "owner");
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(Role::from_str("superadmin").is_err());
    }
}
