use std::sync::Arc;

use uuid::Uuid;

use crate::{
    authz::Permission,
    dtos::admin::{
        ClaimSelectionView, CreateRoleRequest, EditUserRequest, EditUsersInRoleRequest,
        ManageUserClaimsRequest, ManageUserRolesRequest, RoleSelectionView, UpdateRoleRequest,
    },
    models::{Role, RoleWithMembers, UserResponse},
    services::{IdentityStore, ServiceError},
};

/// Role, user and claim administration.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn IdentityStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    // ==================== Roles ====================

    pub async fn create_role(&self, req: CreateRoleRequest) -> Result<Role, ServiceError> {
        if self.store.find_role_by_name(&req.name).await?.is_some() {
            return Err(ServiceError::RoleAlreadyExists);
        }

        let role = Role::new(req.name);
        self.store.insert_role(&role).await?;
        tracing::info!(role_id = %role.role_id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        self.store.list_roles().await
    }

    pub async fn get_role(&self, role_id: Uuid) -> Result<RoleWithMembers, ServiceError> {
        let role = self
            .store
            .find_role_by_id(role_id)
            .await?
            .ok_or(ServiceError::RoleNotFound)?;
        let members = self.store.role_member_names(role_id).await?;
        Ok(RoleWithMembers { role, members })
    }

    /// Rename a role. Memberships follow the role id and survive.
    pub async fn update_role(
        &self,
        role_id: Uuid,
        req: UpdateRoleRequest,
    ) -> Result<Role, ServiceError> {
        if let Some(existing) = self.store.find_role_by_name(&req.name).await? {
            if existing.role_id != role_id {
                return Err(ServiceError::RoleAlreadyExists);
            }
        }

        if !self.store.update_role_name(role_id, &req.name).await? {
            return Err(ServiceError::RoleNotFound);
        }

        self.store
            .find_role_by_id(role_id)
            .await?
            .ok_or(ServiceError::RoleNotFound)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete_role(role_id).await? {
            return Err(ServiceError::RoleNotFound);
        }
        tracing::info!(role_id = %role_id, "Role deleted");
        Ok(())
    }

    /// Apply the membership checkboxes from the role edit screen. Only
    /// users whose state changed are touched.
    pub async fn edit_users_in_role(
        &self,
        role_id: Uuid,
        req: EditUsersInRoleRequest,
    ) -> Result<(), ServiceError> {
        if self.store.find_role_by_id(role_id).await?.is_none() {
            return Err(ServiceError::RoleNotFound);
        }

        for selection in &req.members {
            let current = self
                .store
                .user_role_ids(selection.user_id)
                .await?
                .contains(&role_id);

            if selection.selected && !current {
                self.store.add_user_to_role(selection.user_id, role_id).await?;
            } else if !selection.selected && current {
                self.store
                    .remove_user_from_role(selection.user_id, role_id)
                    .await?;
            }
        }
        Ok(())
    }

    // ==================== Users ====================

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.store.list_users().await?;
        Ok(users.iter().map(|u| u.sanitized()).collect())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        Ok(user.sanitized())
    }

    pub async fn edit_user(
        &self,
        user_id: Uuid,
        req: EditUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if let Some(existing) = self.store.find_user_by_email(&req.email).await? {
            if existing.user_id != user_id {
                return Err(ServiceError::EmailAlreadyRegistered);
            }
        }

        user.user_name = req.user_name;
        user.email = req.email;
        self.store.update_user(&user).await?;
        Ok(user.sanitized())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete_user(user_id).await? {
            return Err(ServiceError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    // ==================== Role membership ====================

    /// Every known role with the user's current membership state, for the
    /// edit screen.
    pub async fn user_role_selections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RoleSelectionView>, ServiceError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let current = self.store.user_role_ids(user_id).await?;
        let roles = self.store.list_roles().await?;
        Ok(roles
            .into_iter()
            .map(|role| RoleSelectionView {
                selected: current.contains(&role.role_id),
                role_id: role.role_id,
                name: role.name,
            })
            .collect())
    }

    /// Replace the user's role set: remove every current membership, then
    /// add the selected roles. The add phase only runs once the remove
    /// phase has fully succeeded.
    pub async fn manage_user_roles(
        &self,
        user_id: Uuid,
        req: ManageUserRolesRequest,
    ) -> Result<(), ServiceError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        // Selected role ids must exist before anything is removed.
        let mut to_add = Vec::new();
        for selection in &req.roles {
            if self
                .store
                .find_role_by_id(selection.role_id)
                .await?
                .is_none()
            {
                return Err(ServiceError::RoleNotFound);
            }
            if selection.selected {
                to_add.push(selection.role_id);
            }
        }

        self.store.remove_all_user_roles(user_id).await?;
        for role_id in to_add {
            self.store.add_user_to_role(user_id, role_id).await?;
        }

        tracing::info!(user_id = %user_id, "User roles replaced");
        Ok(())
    }

    // ==================== Claims ====================

    /// The full claim catalog with the user's current state, for the edit
    /// screen.
    pub async fn user_claim_selections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ClaimSelectionView>, ServiceError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let current = self.store.user_claims(user_id).await?;
        Ok(Permission::ALL
            .iter()
            .map(|claim| ClaimSelectionView {
                claim_type: claim.as_str().to_string(),
                selected: current.contains(claim),
            })
            .collect())
    }

    /// Replace the user's claim set, remove-all-then-add. Claim names
    /// outside the catalog reject the whole request before any change.
    pub async fn manage_user_claims(
        &self,
        user_id: Uuid,
        req: ManageUserClaimsRequest,
    ) -> Result<(), ServiceError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let mut to_add = Vec::new();
        for selection in &req.claims {
            let claim = Permission::parse(&selection.claim_type)
                .ok_or_else(|| ServiceError::UnknownClaim(selection.claim_type.clone()))?;
            if selection.selected {
                to_add.push(claim);
            }
        }

        self.store.remove_all_user_claims(user_id).await?;
        self.store.add_user_claims(user_id, &to_add).await?;

        tracing::info!(user_id = %user_id, "User claims replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::dtos::admin::{ClaimSelection, MembershipSelection, RoleSelection};
    use crate::models::{ExternalLogin, Role, User, VerificationToken};
    use crate::services::store::MemoryIdentityStore;

    async fn seed_user(store: &Arc<MemoryIdentityStore>, name: &str) -> Uuid {
        let user = User::new(name.into(), format!("{name}@example.com"), None);
        store.insert_user(&user).await.unwrap();
        user.user_id
    }

    #[tokio::test]
    async fn test_role_rename_keeps_memberships() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());

        let role = admin
            .create_role(CreateRoleRequest {
                name: "Staff".into(),
            })
            .await
            .unwrap();
        let user_id = seed_user(&store, "jo").await;
        store.add_user_to_role(user_id, role.role_id).await.unwrap();

        admin
            .update_role(
                role.role_id,
                UpdateRoleRequest {
                    name: "Personnel".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.user_role_names(user_id).await.unwrap(),
            vec!["Personnel".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_role_name_is_rejected() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store);

        admin
            .create_role(CreateRoleRequest {
                name: "Admin".into(),
            })
            .await
            .unwrap();
        let err = admin
            .create_role(CreateRoleRequest {
                name: "admin".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RoleAlreadyExists));
    }

    #[tokio::test]
    async fn test_manage_user_roles_replaces_set() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let user_id = seed_user(&store, "jo").await;

        let a = admin
            .create_role(CreateRoleRequest { name: "A".into() })
            .await
            .unwrap();
        let b = admin
            .create_role(CreateRoleRequest { name: "B".into() })
            .await
            .unwrap();
        store.add_user_to_role(user_id, a.role_id).await.unwrap();

        admin
            .manage_user_roles(
                user_id,
                ManageUserRolesRequest {
                    roles: vec![
                        RoleSelection {
                            role_id: a.role_id,
                            selected: false,
                        },
                        RoleSelection {
                            role_id: b.role_id,
                            selected: true,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.user_role_names(user_id).await.unwrap(),
            vec!["B".to_string()]
        );
    }

    #[tokio::test]
    async fn test_manage_user_roles_unknown_role_changes_nothing() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let user_id = seed_user(&store, "jo").await;

        let a = admin
            .create_role(CreateRoleRequest { name: "A".into() })
            .await
            .unwrap();
        store.add_user_to_role(user_id, a.role_id).await.unwrap();

        let err = admin
            .manage_user_roles(
                user_id,
                ManageUserRolesRequest {
                    roles: vec![RoleSelection {
                        role_id: Uuid::new_v4(),
                        selected: true,
                    }],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RoleNotFound));

        // Existing memberships untouched.
        assert_eq!(
            store.user_role_names(user_id).await.unwrap(),
            vec!["A".to_string()]
        );
    }

    #[tokio::test]
    async fn test_manage_user_claims_validates_catalog() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let user_id = seed_user(&store, "jo").await;

        store
            .add_user_claims(user_id, &[Permission::UserView])
            .await
            .unwrap();

        let err = admin
            .manage_user_claims(
                user_id,
                ManageUserClaimsRequest {
                    claims: vec![ClaimSelection {
                        claim_type: "Make Coffee".into(),
                        selected: true,
                    }],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownClaim(_)));

        // Rejected request left the current claims alone.
        assert_eq!(
            store.user_claims(user_id).await.unwrap(),
            vec![Permission::UserView]
        );
    }

    #[tokio::test]
    async fn test_manage_user_claims_replaces_set() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let user_id = seed_user(&store, "jo").await;

        store
            .add_user_claims(user_id, &[Permission::UserView])
            .await
            .unwrap();

        admin
            .manage_user_claims(
                user_id,
                ManageUserClaimsRequest {
                    claims: vec![
                        ClaimSelection {
                            claim_type: "Create User".into(),
                            selected: true,
                        },
                        ClaimSelection {
                            claim_type: "User View".into(),
                            selected: false,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.user_claims(user_id).await.unwrap(),
            vec![Permission::CreateUser]
        );
    }

    #[tokio::test]
    async fn test_claim_selection_view_covers_catalog() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let user_id = seed_user(&store, "jo").await;
        store
            .add_user_claims(user_id, &[Permission::EditRole])
            .await
            .unwrap();

        let view = admin.user_claim_selections(user_id).await.unwrap();
        assert_eq!(view.len(), Permission::ALL.len());
        assert!(view
            .iter()
            .any(|v| v.claim_type == "Edit Role" && v.selected));
        assert!(view
            .iter()
            .any(|v| v.claim_type == "Create User" && !v.selected));
    }

    #[tokio::test]
    async fn test_edit_users_in_role_applies_diff() {
        let store = Arc::new(MemoryIdentityStore::new());
        let admin = AdminService::new(store.clone());
        let role = admin
            .create_role(CreateRoleRequest {
                name: "Staff".into(),
            })
            .await
            .unwrap();
        let in_role = seed_user(&store, "alice").await;
        let out_of_role = seed_user(&store, "bob").await;
        store.add_user_to_role(in_role, role.role_id).await.unwrap();

        admin
            .edit_users_in_role(
                role.role_id,
                EditUsersInRoleRequest {
                    members: vec![
                        MembershipSelection {
                            user_id: in_role,
                            selected: false,
                        },
                        MembershipSelection {
                            user_id: out_of_role,
                            selected: true,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.role_member_names(role.role_id).await.unwrap(),
            vec!["bob".to_string()]
        );
    }

    /// Identity store whose role-removal step fails, counting any role
    /// additions attempted afterwards.
    #[derive(Default)]
    struct RemoveFailsStore {
        inner: MemoryIdentityStore,
        role_adds: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for RemoveFailsStore {
        async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
            self.inner.find_user_by_id(user_id).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
            self.inner.find_user_by_email(email).await
        }
        async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, ServiceError> {
            self.inner.find_user_by_name(user_name).await
        }
        async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
            self.inner.list_users().await
        }
        async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
            self.inner.insert_user(user).await
        }
        async fn update_user(&self, user: &User) -> Result<(), ServiceError> {
            self.inner.update_user(user).await
        }
        async fn delete_user(&self, user_id: Uuid) -> Result<bool, ServiceError> {
            self.inner.delete_user(user_id).await
        }
        async fn find_external_login(
            &self,
            provider: &str,
            provider_key: &str,
        ) -> Result<Option<ExternalLogin>, ServiceError> {
            self.inner.find_external_login(provider, provider_key).await
        }
        async fn insert_external_login(&self, login: &ExternalLogin) -> Result<(), ServiceError> {
            self.inner.insert_external_login(login).await
        }
        async fn insert_role(&self, role: &Role) -> Result<(), ServiceError> {
            self.inner.insert_role(role).await
        }
        async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, ServiceError> {
            self.inner.find_role_by_id(role_id).await
        }
        async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, ServiceError> {
            self.inner.find_role_by_name(name).await
        }
        async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
            self.inner.list_roles().await
        }
        async fn update_role_name(&self, role_id: Uuid, name: &str) -> Result<bool, ServiceError> {
            self.inner.update_role_name(role_id, name).await
        }
        async fn delete_role(&self, role_id: Uuid) -> Result<bool, ServiceError> {
            self.inner.delete_role(role_id).await
        }
        async fn user_role_names(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
            self.inner.user_role_names(user_id).await
        }
        async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
            self.inner.user_role_ids(user_id).await
        }
        async fn role_member_names(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError> {
            self.inner.role_member_names(role_id).await
        }
        async fn add_user_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError> {
            self.role_adds.fetch_add(1, Ordering::SeqCst);
            self.inner.add_user_to_role(user_id, role_id).await
        }
        async fn remove_user_from_role(
            &self,
            user_id: Uuid,
            role_id: Uuid,
        ) -> Result<(), ServiceError> {
            self.inner.remove_user_from_role(user_id, role_id).await
        }
        async fn remove_all_user_roles(&self, _user_id: Uuid) -> Result<(), ServiceError> {
            Err(ServiceError::InternalString(
                "storage failure during role removal".to_string(),
            ))
        }
        async fn user_claims(&self, user_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
            self.inner.user_claims(user_id).await
        }
        async fn remove_all_user_claims(&self, user_id: Uuid) -> Result<(), ServiceError> {
            self.inner.remove_all_user_claims(user_id).await
        }
        async fn add_user_claims(
            &self,
            user_id: Uuid,
            claims: &[Permission],
        ) -> Result<(), ServiceError> {
            self.inner.add_user_claims(user_id, claims).await
        }
        async fn insert_verification_token(
            &self,
            token: &VerificationToken,
        ) -> Result<(), ServiceError> {
            self.inner.insert_verification_token(token).await
        }
        async fn find_verification_token(
            &self,
            user_id: Uuid,
            token_hash: &str,
            purpose: &str,
        ) -> Result<Option<VerificationToken>, ServiceError> {
            self.inner
                .find_verification_token(user_id, token_hash, purpose)
                .await
        }
        async fn delete_verification_tokens(
            &self,
            user_id: Uuid,
            purpose: &str,
        ) -> Result<(), ServiceError> {
            self.inner.delete_verification_tokens(user_id, purpose).await
        }
    }

    #[tokio::test]
    async fn test_failed_role_removal_blocks_additions() {
        let store = Arc::new(RemoveFailsStore::default());
        let admin = AdminService::new(store.clone());

        let user = User::new("jo".into(), "jo@example.com".into(), None);
        store.inner.insert_user(&user).await.unwrap();

        let held = Role::new("Held".into());
        let wanted = Role::new("Wanted".into());
        store.inner.insert_role(&held).await.unwrap();
        store.inner.insert_role(&wanted).await.unwrap();
        store
            .inner
            .add_user_to_role(user.user_id, held.role_id)
            .await
            .unwrap();

        let err = admin
            .manage_user_roles(
                user.user_id,
                ManageUserRolesRequest {
                    roles: vec![
                        RoleSelection {
                            role_id: held.role_id,
                            selected: false,
                        },
                        RoleSelection {
                            role_id: wanted.role_id,
                            selected: true,
                        },
                    ],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InternalString(_)));

        // The add phase never ran and the pre-edit state is intact.
        assert_eq!(store.role_adds.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.inner.user_role_names(user.user_id).await.unwrap(),
            vec!["Held".to_string()]
        );
    }
}
