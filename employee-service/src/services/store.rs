//! Storage seams for identity and employee data.
//!
//! The Postgres-backed [`Database`](super::Database) implements both
//! traits for production; the in-memory stores back tests and local
//! development without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::authz::Permission;
use crate::models::{Department, Employee, ExternalLogin, Gender, Role, User, VerificationToken};
use crate::services::ServiceError;

/// Account, role, claim and verification token storage.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, ServiceError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, ServiceError>;
    async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;
    /// Persist every mutable field of the user row.
    async fn update_user(&self, user: &User) -> Result<(), ServiceError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, ServiceError>;

    async fn find_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> Result<Option<ExternalLogin>, ServiceError>;
    async fn insert_external_login(&self, login: &ExternalLogin) -> Result<(), ServiceError>;

    async fn insert_role(&self, role: &Role) -> Result<(), ServiceError>;
    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, ServiceError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, ServiceError>;
    async fn list_roles(&self) -> Result<Vec<Role>, ServiceError>;
    async fn update_role_name(&self, role_id: Uuid, name: &str) -> Result<bool, ServiceError>;
    /// Delete the role and its memberships. Member users survive.
    async fn delete_role(&self, role_id: Uuid) -> Result<bool, ServiceError>;

    /// Names of the roles the user belongs to.
    async fn user_role_names(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError>;
    /// Ids of the roles the user belongs to.
    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError>;
    /// User names of the role's members.
    async fn role_member_names(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError>;
    async fn add_user_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError>;
    async fn remove_user_from_role(&self, user_id: Uuid, role_id: Uuid)
        -> Result<(), ServiceError>;
    async fn remove_all_user_roles(&self, user_id: Uuid) -> Result<(), ServiceError>;

    async fn user_claims(&self, user_id: Uuid) -> Result<Vec<Permission>, ServiceError>;
    async fn remove_all_user_claims(&self, user_id: Uuid) -> Result<(), ServiceError>;
    async fn add_user_claims(
        &self,
        user_id: Uuid,
        claims: &[Permission],
    ) -> Result<(), ServiceError>;

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), ServiceError>;
    async fn find_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        purpose: &str,
    ) -> Result<Option<VerificationToken>, ServiceError>;
    /// Drop every token the user holds for the purpose. Called on issue
    /// (supersede) and on redeem (single use).
    async fn delete_verification_tokens(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<(), ServiceError>;
}

/// Employee record storage.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Insert and return the record with its server-assigned id.
    async fn insert_employee(
        &self,
        name: &str,
        email: &str,
        department: Department,
        gender: Gender,
        photo_path: Option<&str>,
    ) -> Result<Employee, ServiceError>;
    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, ServiceError>;
    async fn list_employees(&self) -> Result<Vec<Employee>, ServiceError>;
    async fn update_employee(&self, employee: &Employee) -> Result<bool, ServiceError>;
    async fn delete_employee(&self, id: i64) -> Result<bool, ServiceError>;
}

/// In-memory identity store.
#[derive(Default)]
pub struct MemoryIdentityStore {
    inner: Mutex<MemoryIdentityInner>,
}

#[derive(Default)]
struct MemoryIdentityInner {
    users: HashMap<Uuid, User>,
    external_logins: Vec<ExternalLogin>,
    roles: HashMap<Uuid, Role>,
    // (user_id, role_id)
    memberships: Vec<(Uuid, Uuid)>,
    claims: HashMap<Uuid, Vec<Permission>>,
    tokens: Vec<VerificationToken>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.user_name.eq_ignore_ascii_case(user_name))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let mut users: Vec<User> = self.inner.lock().unwrap().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_utc);
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(user.user_id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.contains_key(&user.user_id) {
            return Err(ServiceError::UserNotFound);
        }
        inner.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let existed = inner.users.remove(&user_id).is_some();
        inner.memberships.retain(|(u, _)| *u != user_id);
        inner.claims.remove(&user_id);
        inner.tokens.retain(|t| t.user_id != user_id);
        inner.external_logins.retain(|l| l.user_id != user_id);
        Ok(existed)
    }

    async fn find_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> Result<Option<ExternalLogin>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .external_logins
            .iter()
            .find(|l| l.provider == provider && l.provider_key == provider_key)
            .cloned())
    }

    async fn insert_external_login(&self, login: &ExternalLogin) -> Result<(), ServiceError> {
        self.inner.lock().unwrap().external_logins.push(login.clone());
        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .roles
            .insert(role.role_id, role.clone());
        Ok(())
    }

    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, ServiceError> {
        Ok(self.inner.lock().unwrap().roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .roles
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        let mut roles: Vec<Role> = self.inner.lock().unwrap().roles.values().cloned().collect();
        roles.sort_by_key(|r| r.created_utc);
        Ok(roles)
    }

    async fn update_role_name(&self, role_id: Uuid, name: &str) -> Result<bool, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.roles.get_mut(&role_id) {
            Some(role) => {
                role.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<bool, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let existed = inner.roles.remove(&role_id).is_some();
        inner.memberships.retain(|(_, r)| *r != role_id);
        Ok(existed)
    }

    async fn user_role_names(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut names: Vec<String> = inner
            .memberships
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| inner.roles.get(r).map(|role| role.name.clone()))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .memberships
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect())
    }

    async fn role_member_names(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        let mut names: Vec<String> = inner
            .memberships
            .iter()
            .filter(|(_, r)| *r == role_id)
            .filter_map(|(u, _)| inner.users.get(u).map(|user| user.user_name.clone()))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn add_user_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.memberships.contains(&(user_id, role_id)) {
            inner.memberships.push((user_id, role_id));
        }
        Ok(())
    }

    async fn remove_user_from_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .memberships
            .retain(|m| *m != (user_id, role_id));
        Ok(())
    }

    async fn remove_all_user_roles(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .memberships
            .retain(|(u, _)| *u != user_id);
        Ok(())
    }

    async fn user_claims(&self, user_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .claims
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_all_user_claims(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.inner.lock().unwrap().claims.remove(&user_id);
        Ok(())
    }

    async fn add_user_claims(
        &self,
        user_id: Uuid,
        claims: &[Permission],
    ) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.claims.entry(user_id).or_default();
        for claim in claims {
            if !entry.contains(claim) {
                entry.push(*claim);
            }
        }
        Ok(())
    }

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), ServiceError> {
        self.inner.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn find_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        purpose: &str,
    ) -> Result<Option<VerificationToken>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tokens
            .iter()
            .find(|t| t.user_id == user_id && t.token_hash == token_hash && t.purpose == purpose)
            .cloned())
    }

    async fn delete_verification_tokens(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<(), ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .retain(|t| !(t.user_id == user_id && t.purpose == purpose));
        Ok(())
    }
}

/// In-memory employee store with a sequential id counter, matching the
/// BIGSERIAL column in Postgres.
#[derive(Default)]
pub struct MemoryEmployeeStore {
    next_id: AtomicI64,
    employees: Mutex<HashMap<i64, Employee>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            employees: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn insert_employee(
        &self,
        name: &str,
        email: &str,
        department: Department,
        gender: Gender,
        photo_path: Option<&str>,
    ) -> Result<Employee, ServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let employee = Employee {
            id,
            name: name.to_string(),
            email: email.to_string(),
            department,
            gender,
            photo_path: photo_path.map(|p| p.to_string()),
        };
        self.employees.lock().unwrap().insert(id, employee.clone());
        Ok(employee)
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, ServiceError> {
        Ok(self.employees.lock().unwrap().get(&id).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, ServiceError> {
        let mut employees: Vec<Employee> =
            self.employees.lock().unwrap().values().cloned().collect();
        employees.sort_by_key(|e| e.id);
        Ok(employees)
    }

    async fn update_employee(&self, employee: &Employee) -> Result<bool, ServiceError> {
        let mut employees = self.employees.lock().unwrap();
        match employees.get_mut(&employee.id) {
            Some(existing) => {
                *existing = employee.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_employee(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.employees.lock().unwrap().remove(&id).is_some())
    }
}
