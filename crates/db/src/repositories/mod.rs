//! Repository layer: one module per table, plus the composite admission and
//! settlement flows that span several tables inside a single transaction.

mod auth_token_repo;
mod credit_repo;
mod daily_limit_repo;
mod order_repo;
mod package_repo;
mod push_subscription_repo;
mod transaction_repo;
mod user_repo;

pub use auth_token_repo::AuthTokenRepo;
pub use credit_repo::CreditRepo;
pub use daily_limit_repo::DailyLimitRepo;
pub use order_repo::{AdmissionError, OrderRepo};
pub use package_repo::PackageRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
pub use transaction_repo::{SettlementOutcome, TransactionRepo};
pub use user_repo::UserRepo;
