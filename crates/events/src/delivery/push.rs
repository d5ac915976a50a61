//! Web Push delivery with VAPID authorization.
//!
//! [`PushDelivery`] wakes an admin's service worker by POSTing an empty
//! payload-free notification to the subscription endpoint, signed with a
//! VAPID ES256 token (RFC 8292). The service worker fetches fresh state
//! itself, so no payload encryption is involved.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Push messages are a wake-up signal; don't queue them for long.
const PUSH_TTL_SECS: u32 = 30;

/// VAPID token lifetime. The RFC caps it at 24 hours.
const TOKEN_LIFETIME_SECS: i64 = 12 * 60 * 60;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for Web Push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push service says the subscription no longer exists; the
    /// caller should prune it.
    #[error("subscription gone (HTTP {0})")]
    Gone(u16),

    /// The push service returned another non-2xx status code.
    #[error("push service returned HTTP {0}")]
    HttpStatus(u16),

    /// The endpoint URL could not be parsed into an audience origin.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The VAPID signing key is unusable.
    #[error("VAPID key error: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
}

// ---------------------------------------------------------------------------
// VapidConfig
// ---------------------------------------------------------------------------

/// VAPID application-server identity.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// Base64url-encoded uncompressed P-256 public point, as handed to
    /// `PushManager.subscribe()` in the browser.
    pub public_key: String,
    /// PEM-encoded EC private key matching `public_key`.
    pub private_key_pem: String,
    /// Contact URI for the push service operator, e.g. `mailto:ops@...`.
    pub subject: String,
}

impl VapidConfig {
    /// Load the VAPID identity from the environment.
    ///
    /// Returns `None` if `VAPID_PUBLIC_KEY` is not set, signalling that
    /// push delivery is not configured and should be skipped.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `VAPID_PUBLIC_KEY` | yes | — |
    /// | `VAPID_PRIVATE_KEY_PEM` | yes | — |
    /// | `VAPID_SUBJECT` | no | `mailto:admin@checkmate.local` |
    pub fn from_env() -> Option<Self> {
        let public_key = std::env::var("VAPID_PUBLIC_KEY").ok()?;
        let private_key_pem = std::env::var("VAPID_PRIVATE_KEY_PEM").ok()?;
        Some(Self {
            public_key,
            private_key_pem,
            subject: std::env::var("VAPID_SUBJECT")
                .unwrap_or_else(|_| "mailto:admin@checkmate.local".to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
struct VapidClaims {
    aud: String,
    exp: i64,
    sub: String,
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

/// Sends VAPID-authorized wake-up pushes to browser subscription
/// endpoints.
pub struct PushDelivery {
    client: reqwest::Client,
    public_key: String,
    subject: String,
    signing_key: EncodingKey,
}

impl PushDelivery {
    pub fn new(config: VapidConfig) -> Result<Self, PushError> {
        let signing_key = EncodingKey::from_ec_pem(config.private_key_pem.as_bytes())?;
        Ok(Self {
            client: reqwest::Client::new(),
            public_key: config.public_key,
            subject: config.subject,
            signing_key,
        })
    }

    /// Deliver a wake-up push to one subscription endpoint.
    ///
    /// `topic` labels the push so the service can collapse undelivered
    /// duplicates of the same kind (RFC 8030 §5.4).
    pub async fn deliver(&self, endpoint: &str, topic: &str) -> Result<(), PushError> {
        let audience = Self::audience(endpoint)?;
        let claims = VapidClaims {
            aud: audience,
            exp: chrono::Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
            sub: self.subject.clone(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.signing_key)?;

        let response = self
            .client
            .post(endpoint)
            .header(
                "Authorization",
                format!("vapid t={token}, k={}", self.public_key),
            )
            .header("TTL", PUSH_TTL_SECS.to_string())
            .header("Topic", Self::topic_label(topic))
            .body(Vec::new())
            .send()
            .await?;

        match response.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            // 404/410 mean the browser dropped the subscription.
            s @ (404 | 410) => Err(PushError::Gone(s)),
            s => Err(PushError::HttpStatus(s)),
        }
    }

    /// Topic values are capped at 32 base64url characters; event types
    /// use dots, so anything outside the alphabet becomes `-`.
    fn topic_label(topic: &str) -> String {
        topic
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .take(32)
            .collect()
    }

    /// The VAPID audience is the origin of the push service, not the full
    /// endpoint path.
    fn audience(endpoint: &str) -> Result<String, PushError> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| PushError::InvalidEndpoint(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| PushError::InvalidEndpoint("missing host".to_string()))?;
        let mut audience = format!("{}://{host}", url.scheme());
        if let Some(port) = url.port() {
            audience.push_str(&format!(":{port}"));
        }
        Ok(audience)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
