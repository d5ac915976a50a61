//! Entity models and DTOs, one module per table.

pub mod auth_token;
pub mod daily_limit;
pub mod order;
pub mod package;
pub mod push_subscription;
pub mod status;
pub mod transaction;
pub mod user;
pub mod user_credits;
