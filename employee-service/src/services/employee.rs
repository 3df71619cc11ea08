use std::sync::Arc;

use crate::{
    dtos::employee::{CreateEmployeeRequest, UpdateEmployeeRequest},
    models::EmployeeResponse,
    services::{protect::IdProtector, EmployeeStore, ServiceError},
};

/// Employee CRUD. Raw integer ids never cross this boundary: inputs are
/// protected tokens, outputs carry protected tokens.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
    protector: IdProtector,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>, protector: IdProtector) -> Self {
        Self { store, protector }
    }

    pub async fn create(
        &self,
        req: CreateEmployeeRequest,
    ) -> Result<EmployeeResponse, ServiceError> {
        let employee = self
            .store
            .insert_employee(
                &req.name,
                &req.email,
                req.department,
                req.gender,
                req.photo_path.as_deref(),
            )
            .await?;

        tracing::info!(employee_id = employee.id, "Employee created");

        let protected_id = self.protector.protect(employee.id);
        Ok(EmployeeResponse::from_employee(employee, protected_id))
    }

    pub async fn get(&self, token: &str) -> Result<EmployeeResponse, ServiceError> {
        let id = self.unprotect(token)?;
        let employee = self
            .store
            .find_employee(id)
            .await?
            .ok_or(ServiceError::EmployeeNotFound)?;

        Ok(EmployeeResponse::from_employee(employee, token.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<EmployeeResponse>, ServiceError> {
        let employees = self.store.list_employees().await?;
        Ok(employees
            .into_iter()
            .map(|e| {
                let protected_id = self.protector.protect(e.id);
                EmployeeResponse::from_employee(e, protected_id)
            })
            .collect())
    }

    pub async fn update(
        &self,
        token: &str,
        req: UpdateEmployeeRequest,
    ) -> Result<EmployeeResponse, ServiceError> {
        let id = self.unprotect(token)?;
        let mut employee = self
            .store
            .find_employee(id)
            .await?
            .ok_or(ServiceError::EmployeeNotFound)?;

        employee.name = req.name;
        employee.email = req.email;
        employee.department = req.department;
        employee.gender = req.gender;
        employee.photo_path = req.photo_path;

        if !self.store.update_employee(&employee).await? {
            return Err(ServiceError::EmployeeNotFound);
        }

        Ok(EmployeeResponse::from_employee(employee, token.to_string()))
    }

    pub async fn delete(&self, token: &str) -> Result<(), ServiceError> {
        let id = self.unprotect(token)?;
        if !self.store.delete_employee(id).await? {
            return Err(ServiceError::EmployeeNotFound);
        }
        tracing::info!(employee_id = id, "Employee deleted");
        Ok(())
    }

    /// A token that fails to decode reads exactly like a missing record,
    /// so forged or foreign tokens learn nothing.
    fn unprotect(&self, token: &str) -> Result<i64, ServiceError> {
        self.protector
            .unprotect(token)
            .map_err(|_| ServiceError::EmployeeNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, Gender};
    use crate::services::protect::EMPLOYEE_ID_PURPOSE;
    use crate::services::store::MemoryEmployeeStore;

    fn service() -> EmployeeService {
        let key = IdProtector::parse_master_key(
            "6f6c3d8a1b2c4e5f00112233445566778899aabbccddeeff0011223344556677",
        )
        .unwrap();
        EmployeeService::new(
            Arc::new(MemoryEmployeeStore::new()),
            IdProtector::new(&key, EMPLOYEE_ID_PURPOSE),
        )
    }

    fn create_req(name: &str) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            department: Department::It,
            gender: Gender::Unselected,
            photo_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_by_token() {
        let svc = service();
        let created = svc.create(create_req("jo")).await.unwrap();

        // The exposed id is opaque, not the integer.
        assert!(created.id.parse::<i64>().is_err());

        let fetched = svc.get(&created.id).await.unwrap();
        assert_eq!(fetched.name, "jo");
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn test_forged_token_reads_as_not_found() {
        let svc = service();
        svc.create(create_req("jo")).await.unwrap();

        let err = svc.get("not-a-real-token").await.unwrap_err();
        assert!(matches!(err, ServiceError::EmployeeNotFound));

        let err = svc.delete("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").await.unwrap_err();
        assert!(matches!(err, ServiceError::EmployeeNotFound));
    }

    #[tokio::test]
    async fn test_update_and_delete_roundtrip() {
        let svc = service();
        let created = svc.create(create_req("jo")).await.unwrap();

        let updated = svc
            .update(
                &created.id,
                UpdateEmployeeRequest {
                    name: "Jo Updated".into(),
                    email: "jo@example.com".into(),
                    department: Department::Hr,
                    gender: Gender::Female,
                    photo_path: Some("photos/jo.png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Jo Updated");
        assert_eq!(updated.department, Department::Hr);

        svc.delete(&created.id).await.unwrap();
        let err = svc.get(&created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmployeeNotFound));
    }

    #[tokio::test]
    async fn test_list_exposes_protected_ids() {
        let svc = service();
        svc.create(create_req("a")).await.unwrap();
        svc.create(create_req("b")).await.unwrap();

        let all = svc.list().await.unwrap();
        assert_eq!(all.len(), 2);
        for resp in &all {
            assert!(svc.get(&resp.id).await.is_ok());
        }
    }
}
