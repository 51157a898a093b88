use std::collections::HashMap;
use std::sync::RwLock;

use tracing::info;

use promobot_core::{PrincipalId, Role};

use crate::error::{Result, RoleError};
use crate::permissions;

/// Thread-safe registry mapping principals to roles.
///
/// Shared by every job loop and the control surface, so reads go through an
/// `RwLock`. The admin set starts empty; only the Owner mutates it.
pub struct RoleRegistry {
    owner: PrincipalId,
    roles: RwLock<HashMap<PrincipalId, Role>>,
}

impl RoleRegistry {
    /// Build a registry with the fixed Owner and an empty admin set.
    pub fn new(owner: PrincipalId) -> Self {
        Self {
            owner,
            roles: RwLock::new(HashMap::new()),
        }
    }

    pub fn owner(&self) -> PrincipalId {
        self.owner
    }

    /// Resolve a principal's role. Unknown principals are `Role::None`.
    pub fn role_of(&self, principal: PrincipalId) -> Role {
        if principal == self.owner {
            return Role::Owner;
        }
        self.roles
            .read()
            .unwrap()
            .get(&principal)
            .copied()
            .unwrap_or(Role::None)
    }

    /// Assign `role` to `target`. Owner only.
    ///
    /// Assigning to a principal the process has never seen is allowed — it
    /// models pre-authorization. The Owner's own role can never be changed,
    /// and `Role::Owner` can never be granted.
    pub fn set_role(&self, actor: PrincipalId, target: PrincipalId, role: Role) -> Result<()> {
        if !permissions::can_add_admin(self.role_of(actor)) {
            return Err(RoleError::Forbidden {
                reason: "only the owner may assign roles".to_string(),
            });
        }
        if target == self.owner || role == Role::Owner {
            return Err(RoleError::OwnerImmutable(target));
        }

        let mut roles = self.roles.write().unwrap();
        if role == Role::None {
            roles.remove(&target);
        } else {
            roles.insert(target, role);
        }
        info!(%actor, %target, %role, "role assigned");
        Ok(())
    }

    /// Remove any role from `target`. Owner only.
    pub fn revoke(&self, actor: PrincipalId, target: PrincipalId) -> Result<()> {
        self.set_role(actor, target, Role::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: PrincipalId = PrincipalId(100);
    const ALICE: PrincipalId = PrincipalId(1);
    const BOB: PrincipalId = PrincipalId(2);

    #[test]
    fn owner_role_is_implicit() {
        let reg = RoleRegistry::new(OWNER);
        assert_eq!(reg.role_of(OWNER), Role::Owner);
        assert_eq!(reg.role_of(ALICE), Role::None);
    }

    #[test]
    fn only_owner_assigns_roles() {
        let reg = RoleRegistry::new(OWNER);
        reg.set_role(OWNER, ALICE, Role::Manager).unwrap();
        assert_eq!(reg.role_of(ALICE), Role::Manager);

        // Even a freshly minted manager cannot grant roles.
        let err = reg.set_role(ALICE, BOB, Role::Viewer).unwrap_err();
        assert!(matches!(err, RoleError::Forbidden { .. }));
        assert_eq!(reg.role_of(BOB), Role::None);
    }

    #[test]
    fn pre_authorization_of_unknown_principal_is_allowed() {
        let reg = RoleRegistry::new(OWNER);
        reg.set_role(OWNER, PrincipalId(999), Role::Viewer).unwrap();
        assert_eq!(reg.role_of(PrincipalId(999)), Role::Viewer);
    }

    #[test]
    fn owner_is_immutable() {
        let reg = RoleRegistry::new(OWNER);
        assert!(matches!(
            reg.set_role(OWNER, OWNER, Role::Viewer),
            Err(RoleError::OwnerImmutable(_))
        ));
        assert!(matches!(
            reg.set_role(OWNER, ALICE, Role::Owner),
            Err(RoleError::OwnerImmutable(_))
        ));
    }

    #[test]
    fn revoke_returns_principal_to_none() {
        let reg = RoleRegistry::new(OWNER);
        reg.set_role(OWNER, ALICE, Role::Editor).unwrap();
        reg.revoke(OWNER, ALICE).unwrap();
        assert_eq!(reg.role_of(ALICE), Role::None);
    }
}
