//! Background tasks spawned by the server binary.

pub mod order_cleanup;
pub mod token_cleanup;
