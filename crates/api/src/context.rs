use gatehouse_auth::Role;
use gatehouse_core::AccountId;

/// Principal context for a request (authenticated identity + role).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalContext {
    account_id: AccountId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
