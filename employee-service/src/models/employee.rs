//! Employee model - the business entity managed by the service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Department codes, including the form placeholder value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Department {
    Unselected,
    None,
    It,
    Account,
    Payroll,
    Hr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Gender {
    Unselected,
    Male,
    Female,
    Transgender,
}

/// Employee entity. The id is server-assigned and sequential; it leaves the
/// service only as a protected token.
#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: Department,
    pub gender: Gender,
    pub photo_path: Option<String>,
}

/// Employee response carrying the protected id token in place of the raw id.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: Department,
    pub gender: Gender,
    pub photo_path: Option<String>,
}

impl EmployeeResponse {
    pub fn from_employee(employee: Employee, protected_id: String) -> Self {
        Self {
            id: protected_id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            gender: employee.gender,
            photo_path: employee.photo_path,
        }
    }
}
