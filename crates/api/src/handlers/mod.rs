//! HTTP handler modules, grouped by resource.

pub mod auth;
pub mod daily_limit;
pub mod downloads;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod packages;
pub mod payments;
pub mod users;
