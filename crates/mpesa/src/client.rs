//! Daraja STK Push client.
//!
//! Implements [`PaymentGateway`] against the Safaricom Daraja API: OAuth
//! client-credentials token fetch, STK push initiation, and the status
//! query the poll loop drives.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::api::{
    StkPushRequest, StkPushResponse, StkQueryRequest, StkQueryResponse, TokenResponse,
};
use crate::{GatewayError, PaymentGateway, PollOutcome, StkPushHandle};

/// Daraja answers a query for a still-open prompt with this error code
/// instead of a result.
const ERROR_STILL_PROCESSING: &str = "500.001.1001";

/// Daraja connection settings.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    /// Base URL, e.g. `https://sandbox.safaricom.co.ke`.
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Paybill/till number acting as both `BusinessShortCode` and `PartyB`.
    pub short_code: String,
    pub passkey: String,
    /// URL Daraja posts its asynchronous callback to.
    pub callback_url: String,
}

impl MpesaConfig {
    /// Load the Daraja settings from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MPESA_BASE_URL` | `https://sandbox.safaricom.co.ke` |
    /// | `MPESA_CONSUMER_KEY` | (required) |
    /// | `MPESA_CONSUMER_SECRET` | (required) |
    /// | `MPESA_SHORT_CODE` | `174379` |
    /// | `MPESA_PASSKEY` | (required) |
    /// | `MPESA_CALLBACK_URL` | (required) |
    pub fn from_env() -> Result<Self, String> {
        let require = |name: &str| {
            std::env::var(name).map_err(|_| format!("missing required env var {name}"))
        };
        Ok(Self {
            base_url: std::env::var("MPESA_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.safaricom.co.ke".to_string()),
            consumer_key: require("MPESA_CONSUMER_KEY")?,
            consumer_secret: require("MPESA_CONSUMER_SECRET")?,
            short_code: std::env::var("MPESA_SHORT_CODE")
                .unwrap_or_else(|_| "174379".to_string()),
            passkey: require("MPESA_PASSKEY")?,
            callback_url: require("MPESA_CALLBACK_URL")?,
        })
    }
}

/// HTTP client for the Daraja API.
pub struct MpesaClient {
    client: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch a short-lived bearer token via client credentials.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(format!(
                "{}/oauth/v1/generate?grant_type=client_credentials",
                self.config.base_url
            ))
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?;

        let token: TokenResponse = Self::parse_response(response).await?;
        Ok(token.access_token)
    }

    /// The Daraja request password: `base64(shortcode + passkey + timestamp)`.
    fn credentials(&self) -> (String, String) {
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = BASE64.encode(format!(
            "{}{}{}",
            self.config.short_code, self.config.passkey, timestamp
        ));
        (password, timestamp)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    fn classify_query(response: StkQueryResponse) -> PollOutcome {
        if let Some(code) = response.result_code {
            return match code.as_str() {
                "0" => PollOutcome::Completed,
                // Prompt timed out before the customer reacted; the
                // payment may still land, keep polling.
                "1037" => PollOutcome::StillPending,
                "1032" => PollOutcome::Failed {
                    reason: "Request cancelled by user".to_string(),
                },
                _ => PollOutcome::Failed {
                    reason: response
                        .result_desc
                        .unwrap_or_else(|| format!("payment failed (code {code})")),
                },
            };
        }
        if let Some(code) = response.error_code {
            if code == ERROR_STILL_PROCESSING {
                return PollOutcome::StillPending;
            }
            return PollOutcome::Failed {
                reason: response
                    .error_message
                    .unwrap_or_else(|| format!("provider error {code}")),
            };
        }
        // Neither a verdict nor an error envelope; treat as undecided.
        PollOutcome::StillPending
    }
}

#[async_trait]
impl PaymentGateway for MpesaClient {
    async fn initiate_stk_push(
        &self,
        phone_number: &str,
        amount: u32,
        account_reference: &str,
    ) -> Result<StkPushHandle, GatewayError> {
        let token = self.access_token().await?;
        let (password, timestamp) = self.credentials();

        let body = StkPushRequest {
            business_short_code: self.config.short_code.clone(),
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount,
            party_a: phone_number.to_string(),
            party_b: self.config.short_code.clone(),
            phone_number: phone_number.to_string(),
            callback_url: self.config.callback_url.clone(),
            account_reference: account_reference.to_string(),
            transaction_desc: "Document check slots".to_string(),
        };

        let response = self
            .client
            .post(format!(
                "{}/mpesa/stkpush/v1/processrequest",
                self.config.base_url
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let push: StkPushResponse = Self::parse_response(response).await?;
        if push.response_code != "0" {
            return Err(GatewayError::Protocol(format!(
                "STK push rejected with response code {}",
                push.response_code
            )));
        }

        tracing::info!(
            checkout_request_id = %push.checkout_request_id,
            "STK push initiated"
        );
        Ok(StkPushHandle {
            checkout_request_id: push.checkout_request_id,
            merchant_request_id: push.merchant_request_id,
            customer_message: push.customer_message,
        })
    }

    async fn query_status(&self, checkout_request_id: &str) -> Result<PollOutcome, GatewayError> {
        let token = self.access_token().await?;
        let (password, timestamp) = self.credentials();

        let body = StkQueryRequest {
            business_short_code: self.config.short_code.clone(),
            password,
            timestamp,
            checkout_request_id: checkout_request_id.to_string(),
        };

        let response = self
            .client
            .post(format!(
                "{}/mpesa/stkpushquery/v1/query",
                self.config.base_url
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // Rate-limit fault envelopes come back as plain 4xx/5xx bodies;
        // back off rather than failing the transaction.
        if !status.is_success() {
            if text.contains("fault") || text.contains("Spike arrest") {
                return Ok(PollOutcome::StillPending);
            }
            if let Ok(parsed) = serde_json::from_str::<StkQueryResponse>(&text) {
                return Ok(Self::classify_query(parsed));
            }
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: StkQueryResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Protocol(format!("unparseable query response: {e}")))?;
        Ok(Self::classify_query(parsed))
    }
}
