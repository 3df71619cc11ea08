pub mod employee;
pub mod role;
pub mod user;
pub mod verification_token;

pub use employee::{Department, Employee, EmployeeResponse, Gender};
pub use role::{Role, RoleWithMembers};
pub use user::{ExternalLogin, User, UserResponse};
pub use verification_token::{TokenPurpose, VerificationToken};
