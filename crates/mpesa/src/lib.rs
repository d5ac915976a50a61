//! M-Pesa mobile-money integration.
//!
//! Exposes the [`PaymentGateway`] trait the API layer talks to, plus the
//! concrete Daraja STK Push client. Handlers depend on the trait so tests
//! can swap in a stub gateway without touching Safaricom.

mod api;
mod client;

pub use client::{MpesaClient, MpesaConfig};

use async_trait::async_trait;

/// Errors from the payment provider layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("payment provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider response could not be interpreted.
    #[error("unexpected provider response: {0}")]
    Protocol(String),
}

/// Provider-side handle for an initiated STK push.
#[derive(Debug, Clone)]
pub struct StkPushHandle {
    /// The reference used for all later status queries.
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    /// Text the provider suggests showing to the paying customer.
    pub customer_message: String,
}

/// Where a previously initiated payment stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The customer entered their PIN and the money moved.
    Completed,
    /// No verdict yet: prompt still open, customer unreachable, or the
    /// provider asked us to back off. Poll again later.
    StillPending,
    /// Terminal provider-side failure with a customer-facing reason.
    Failed { reason: String },
}

/// Seam between the API layer and the mobile-money provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Push a payment prompt to the customer's phone.
    async fn initiate_stk_push(
        &self,
        phone_number: &str,
        amount: u32,
        account_reference: &str,
    ) -> Result<StkPushHandle, GatewayError>;

    /// Ask the provider where a previously initiated payment stands.
    async fn query_status(&self, checkout_request_id: &str) -> Result<PollOutcome, GatewayError>;
}
