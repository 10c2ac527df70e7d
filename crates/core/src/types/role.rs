//! Panel roles and the single role-derivation point.
//!
//! Every place that constructs an identity must go through
//! [`Role::derive`]. Deriving the role inline from backend payloads at each
//! call site is how the super-administrator override drifts out of sync.

use serde::{Deserialize, Serialize};

/// The one account that is always an administrator, regardless of what the
/// backend payload says. This is a deliberate override of backend data (the
/// panel owner's account), not a fallback.
pub const SUPER_ADMIN_EMAIL: &str = "oubraimyassir@gmail.com";

/// Panel role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Places orders and sees their own dashboard.
    #[default]
    Customer,
    /// Oversees customer activity for an agency.
    Manager,
    /// Full panel access, bypasses maintenance mode.
    Administrator,
}

impl Role {
    /// Derive a role from an account email and the backend's role string.
    ///
    /// The super-administrator email always yields [`Role::Administrator`];
    /// otherwise the backend string decides, and anything unrecognized
    /// (including a missing field) falls back to [`Role::Customer`].
    #[must_use]
    pub fn derive(email: &str, backend_role: Option<&str>) -> Self {
        if email.trim().eq_ignore_ascii_case(SUPER_ADMIN_EMAIL) {
            return Self::Administrator;
        }

        match backend_role.map(str::to_lowercase).as_deref() {
            Some("admin" | "administrator") => Self::Administrator,
            Some("manager") => Self::Manager,
            _ => Self::Customer,
        }
    }

    /// Whether this role bypasses the maintenance gate.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Administrator)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Manager => write!(f, "manager"),
            Self::Administrator => write!(f, "administrator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "manager" => Ok(Self::Manager),
            "administrator" => Ok(Self::Administrator),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
