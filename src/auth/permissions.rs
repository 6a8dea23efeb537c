//! Roles and the per-route access table
//!
//! Every caller is either anonymous or holds exactly one [`Role`]. Routes
//! declare the [`Access`] they need; unknown routes are never allowed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an identity is registered under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Uploads projects, sees their own and co-created work
    #[default]
    Student,
    /// Sees every project
    Teacher,
}

impl Role {
    /// Interpret a role as sent by a client.
    ///
    /// Only the exact string `teacher` selects the teacher role; anything
    /// else, including absence, is a student.
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw {
            Some("teacher") => Role::Teacher,
            _ => Role::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access a route requires from its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anonymous callers are fine (the handler may still use the caller)
    Public,
    /// A verified student credential
    Student,
}

/// Get the access a route requires.
/// Returns None for unknown routes (which should be blocked).
pub fn get_required_access(route: &str) -> Option<Access> {
    match route {
        // Identity
        "/login" | "/signup" | "/search-students" => Some(Access::Public),

        // Gallery - listing filters by caller, anonymous sees nothing
        "/projects" | "/retitle" | "/delete" => Some(Access::Public),

        // Uploads are attributed to the caller
        "/upload" => Some(Access::Student),

        // Operational
        "/health" | "/healthz" | "/health-open" | "/ready" | "/readyz" | "/debug-store"
        | "/version" => Some(Access::Public),

        _ => None,
    }
}

/// Message for a caller refused by [`is_route_allowed`]
pub fn access_denied_message(access: Access) -> &'static str {
    match access {
        Access::Student => "Please sign in as a student to upload.",
        Access::Public => "Please sign in.",
    }
}

/// Check if a route is allowed for a caller holding `role` (None = anonymous)
pub fn is_route_allowed(route: &str, role: Option<Role>) -> bool {
    match get_required_access(route) {
        Some(Access::Public) => true,
        Some(Access::Student) => role == Some(Role::Student),
        None => false,
    }
}
