//! Shared response types for API handlers.

use serde::Serialize;

/// Plain `{ "message": ... }` body for endpoints with nothing else to say.
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
