//! Domain logic shared across the Checkmate backend crates.
//!
//! Pure functions and types only — no I/O, no database access. Everything
//! here is exercised by the `checkmate-db` repositories and the
//! `checkmate-api` handlers.

pub mod error;
pub mod phone;
pub mod quota;
pub mod scores;
pub mod storage;
pub mod types;
