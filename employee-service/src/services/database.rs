//! PostgreSQL storage backend.
//!
//! Implements [`IdentityStore`] and [`EmployeeStore`] over sqlx.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::authz::Permission;
use crate::models::{Department, Employee, ExternalLogin, Gender, Role, User, VerificationToken};
use crate::services::store::{EmployeeStore, IdentityStore};
use crate::services::ServiceError;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(user_name) = LOWER($1)")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_utc")
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, user_name, email, email_confirmed, password_hash,
                               failed_login_attempts, lockout_end, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(user.failed_login_attempts)
        .bind(user.lockout_end)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET user_name = $2, email = $3, email_confirmed = $4, password_hash = $5,
                failed_login_attempts = $6, lockout_end = $7
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(user.failed_login_attempts)
        .bind(user.lockout_end)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::UserNotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> Result<Option<ExternalLogin>, ServiceError> {
        sqlx::query_as::<_, ExternalLogin>(
            "SELECT * FROM external_logins WHERE provider = $1 AND provider_key = $2",
        )
        .bind(provider)
        .bind(provider_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(ServiceError::Database)
    }

    async fn insert_external_login(&self, login: &ExternalLogin) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO external_logins (provider, provider_key, user_id) VALUES ($1, $2, $3)",
        )
        .bind(&login.provider)
        .bind(&login.provider_key)
        .bind(login.user_id)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO roles (role_id, name, created_utc) VALUES ($1, $2, $3)")
            .bind(role.role_id)
            .bind(&role.name)
            .bind(role.created_utc)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, ServiceError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, ServiceError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY created_utc")
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn update_role_name(&self, role_id: Uuid, name: &str) -> Result<bool, ServiceError> {
        let result = sqlx::query("UPDATE roles SET name = $2 WHERE role_id = $1")
            .bind(role_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<bool, ServiceError> {
        // user_roles rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_role_names(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name FROM roles r
            JOIN user_roles ur ON ur.role_id = r.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let ids: Vec<(Uuid,)> =
            sqlx::query_as("SELECT role_id FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(ServiceError::Database)?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn role_member_names(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT u.user_name FROM users u
            JOIN user_roles ur ON ur.user_id = u.user_id
            WHERE ur.role_id = $1
            ORDER BY u.user_name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    async fn add_user_to_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn remove_user_from_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), ServiceError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn remove_all_user_roles(&self, user_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn user_claims(&self, user_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT claim_type FROM user_claims WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(ServiceError::Database)?;

        // Rows that no longer match the catalog are skipped rather than
        // failing the whole lookup.
        Ok(rows
            .into_iter()
            .filter_map(|(name,)| Permission::parse(&name))
            .collect())
    }

    async fn remove_all_user_claims(&self, user_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query("DELETE FROM user_claims WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn add_user_claims(
        &self,
        user_id: Uuid,
        claims: &[Permission],
    ) -> Result<(), ServiceError> {
        for claim in claims {
            sqlx::query(
                "INSERT INTO user_claims (user_id, claim_type) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(claim.as_str())
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        }
        Ok(())
    }

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (token_id, user_id, token_hash, purpose,
                                             expires_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(&token.purpose)
        .bind(token.expires_utc)
        .bind(token.created_utc)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(())
    }

    async fn find_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        purpose: &str,
    ) -> Result<Option<VerificationToken>, ServiceError> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT * FROM verification_tokens
            WHERE user_id = $1 AND token_hash = $2 AND purpose = $3
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await
        .map_err(ServiceError::Database)
    }

    async fn delete_verification_tokens(
        &self,
        user_id: Uuid,
        purpose: &str,
    ) -> Result<(), ServiceError> {
        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1 AND purpose = $2")
            .bind(user_id)
            .bind(purpose)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for Database {
    async fn insert_employee(
        &self,
        name: &str,
        email: &str,
        department: Department,
        gender: Gender,
        photo_path: Option<&str>,
    ) -> Result<Employee, ServiceError> {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (name, email, department, gender, photo_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(department)
        .bind(gender)
        .bind(photo_path)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::Database)
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, ServiceError> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, ServiceError> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::Database)
    }

    async fn update_employee(&self, employee: &Employee) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = $2, email = $3, department = $4, gender = $5, photo_path = $6
            WHERE id = $1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.department)
        .bind(employee.gender)
        .bind(&employee.photo_path)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_employee(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
