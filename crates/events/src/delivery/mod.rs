//! External delivery channels: Web Push for admin notifications, SMTP
//! for transactional email.

pub mod email;
pub mod push;
