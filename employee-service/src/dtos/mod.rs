pub mod admin;
pub mod auth;
pub mod employee;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Generic acknowledgement body for flows that intentionally reveal
/// nothing about account state (password reset, confirmation resend).
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
