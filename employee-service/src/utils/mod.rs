pub mod email_domain;
pub mod password;
pub mod validation;
