use serde::Deserialize;
use validator::Validate;

use crate::models::{Department, Gender};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub department: Department,
    pub gender: Gender,
    pub photo_path: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub department: Department,
    pub gender: Gender,
    pub photo_path: Option<String>,
}
