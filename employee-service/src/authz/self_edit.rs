//! Self-edit guard.
//!
//! Admins may manage other users' roles and claims but never their own;
//! otherwise an admin could strip their own "Edit Role" claim and lock the
//! deployment out of role management entirely.

use super::{Decision, Permission, Principal, ADMIN_ROLE};

/// Resolve the target user id the way the management routes carry it: the
/// `userId` query parameter wins if present and non-empty, then the
/// `userId` route-path value. The resolved value is passed explicitly into
/// [`check`]; the guard itself never touches request state.
pub fn resolve_target_user_id<'a>(
    query_user_id: Option<&'a str>,
    path_user_id: Option<&'a str>,
) -> Option<&'a str> {
    match query_user_id {
        Some(id) if !id.is_empty() => Some(id),
        _ => path_user_id.filter(|id| !id.is_empty()),
    }
}

/// Allow iff the actor is an Admin holding the "Edit Role" claim and the
/// target is somebody else (case-insensitive id comparison). Every other
/// combination denies, including a missing target.
pub fn check(principal: &Principal, target_user_id: Option<&str>) -> Decision {
    let target = match target_user_id {
        Some(id) if !id.is_empty() => id,
        _ => return Decision::Deny,
    };

    if principal.user_id.is_empty() {
        return Decision::Deny;
    }

    if principal.is_in_role(ADMIN_ROLE)
        && principal.has_permission(Permission::EditRole)
        && !target.eq_ignore_ascii_case(&principal.user_id)
    {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ACTOR_ID: &str = "7f9c2ba4-e88f-4a5c-9b1d-3c2a1b0e9d8f";
    const OTHER_ID: &str = "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9";

    fn admin_with_edit_role() -> Principal {
        Principal::new(
            ACTOR_ID.to_string(),
            vec![ADMIN_ROLE.to_string()],
            [Permission::EditRole].into_iter().collect::<HashSet<_>>(),
        )
    }

    #[test]
    fn test_admin_editing_other_user_is_allowed() {
        let principal = admin_with_edit_role();
        assert_eq!(check(&principal, Some(OTHER_ID)), Decision::Allow);
    }

    #[test]
    fn test_admin_editing_self_is_denied() {
        let principal = admin_with_edit_role();
        assert_eq!(check(&principal, Some(ACTOR_ID)), Decision::Deny);
    }

    #[test]
    fn test_self_comparison_is_case_insensitive() {
        let principal = admin_with_edit_role();
        let shouted = ACTOR_ID.to_uppercase();
        assert_eq!(check(&principal, Some(&shouted)), Decision::Deny);
    }

    #[test]
    fn test_missing_target_is_denied() {
        let principal = admin_with_edit_role();
        assert_eq!(check(&principal, None), Decision::Deny);
        assert_eq!(check(&principal, Some("")), Decision::Deny);
    }

    #[test]
    fn test_admin_without_edit_role_claim_is_denied() {
        let principal = Principal::new(
            ACTOR_ID.to_string(),
            vec![ADMIN_ROLE.to_string()],
            HashSet::new(),
        );
        assert_eq!(check(&principal, Some(OTHER_ID)), Decision::Deny);
    }

    #[test]
    fn test_edit_role_claim_without_admin_role_is_denied() {
        let principal = Principal::new(
            ACTOR_ID.to_string(),
            vec!["Manager".to_string()],
            [Permission::EditRole].into_iter().collect::<HashSet<_>>(),
        );
        assert_eq!(check(&principal, Some(OTHER_ID)), Decision::Deny);
    }

    #[test]
    fn test_query_value_wins_over_path_value() {
        assert_eq!(
            resolve_target_user_id(Some("from-query"), Some("from-path")),
            Some("from-query")
        );
    }

    #[test]
    fn test_empty_query_value_falls_back_to_path() {
        assert_eq!(
            resolve_target_user_id(Some(""), Some("from-path")),
            Some("from-path")
        );
        assert_eq!(resolve_target_user_id(None, Some("from-path")), Some("from-path"));
    }

    #[test]
    fn test_no_source_yields_no_target() {
        assert_eq!(resolve_target_user_id(None, None), None);
        assert_eq!(resolve_target_user_id(Some(""), None), None);
    }
}
