//! User domain types.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// An account as returned by the auth endpoints.
///
/// Held in the session as a cached, read-only value next to its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Whether the admin panel should be offered to this user.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
