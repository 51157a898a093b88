//! Pure capability predicates over the role enum.
//!
//! Precedence: Owner bypasses everything; Manager controls any job; the
//! creator controls their own jobs; Editor may create and read but not
//! control others' jobs; Viewer is read-only.

use promobot_core::{PrincipalId, Role};

/// May this role create new posting jobs?
pub fn can_create_job(role: Role) -> bool {
    matches!(role, Role::Owner | Role::Manager | Role::Editor)
}

/// May `actor` (holding `role`) start/pause/stop the job created by `creator`?
pub fn can_control(role: Role, actor: PrincipalId, creator: PrincipalId) -> bool {
    match role {
        Role::Owner | Role::Manager => true,
        // Editors control only what they created themselves.
        Role::Editor => actor == creator,
        Role::Viewer | Role::None => false,
    }
}

/// May this role grant or revoke roles? Owner only.
pub fn can_add_admin(role: Role) -> bool {
    role.is_owner()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PrincipalId = PrincipalId(1);
    const BOB: PrincipalId = PrincipalId(2);

    #[test]
    fn viewer_is_read_only() {
        assert!(!can_create_job(Role::Viewer));
        assert!(!can_control(Role::Viewer, ALICE, ALICE));
        assert!(!can_add_admin(Role::Viewer));
    }

    #[test]
    fn editor_controls_only_own_jobs() {
        assert!(can_create_job(Role::Editor));
        assert!(can_control(Role::Editor, ALICE, ALICE));
        assert!(!can_control(Role::Editor, ALICE, BOB));
    }

    #[test]
    fn manager_controls_any_job() {
        assert!(can_control(Role::Manager, ALICE, BOB));
        assert!(!can_add_admin(Role::Manager));
    }

    #[test]
    fn owner_has_all_capabilities() {
        assert!(can_create_job(Role::Owner));
        assert!(can_control(Role::Owner, ALICE, BOB));
        assert!(can_add_admin(Role::Owner));
    }
}
