//! Services layer.
//!
//! Business logic for accounts, administration and employee records,
//! over the storage seams in [`store`].

mod admin;
mod auth;
mod database;
mod email;
pub mod error;
mod employee;
mod jwt;
pub mod protect;
pub mod store;

pub use admin::AdminService;
pub use auth::{AuthService, LockoutPolicy};
pub use database::Database;
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use employee::EmployeeService;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use protect::{IdProtector, ProtectError, EMPLOYEE_ID_PURPOSE};
pub use store::{EmployeeStore, IdentityStore, MemoryEmployeeStore, MemoryIdentityStore};
