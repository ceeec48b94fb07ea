use core::str::FromStr;

use serde::{Deserialize, Serialize};

use gatehouse_core::DomainError;

/// Role held by an account.
///
/// This is a closed set: administrative privilege checks reduce to
/// `role == Role::Admin`, and the persistence layer forces superuser accounts
/// onto `Admin` on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Customer => "customer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "customer" => Ok(Role::Customer),
            other => Err(DomainError::validation(format!(
                "role must be one of admin, manager, customer (got {other:?})"
            ))),
        }
    }
}
