//! Admin PIN verification and the signed tokens handed out in exchange.
//!
//! Token format: `base64url(claims json).base64url(hmac_sha256(claims json))`.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    config::AdminConfig,
    dto::{
        admin::{VerifyPinRequest, VerifyPinResponse},
        format_system_time,
    },
    error::ServiceError,
    state::SharedState,
};

type HmacSha256 = Hmac<Sha256>;

const ADMIN_SUBJECT: &str = "admin";

/// Reasons a presented admin token is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed admin token")]
    Malformed,
    #[error("admin token signature mismatch")]
    BadSignature,
    #[error("admin token expired")]
    Expired,
}

/// Claims carried inside an admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// A freshly signed token with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signs and checks admin tokens with a shared HMAC key.
pub struct AdminTokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl AdminTokenSigner {
    /// Signer keyed with `secret` issuing tokens valid for `ttl`.
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Signer built from the admin section of the configuration.
    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.token_secret.clone(), config.token_ttl)
    }

    /// Sign a token valid from `now` for the configured lifetime.
    pub fn issue(&self, now: OffsetDateTime) -> IssuedToken {
        let expires_at = now + self.ttl;
        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.into(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let payload = serde_json::to_vec(&claims).expect("admin claims serialize to JSON");
        let signature = self.mac(&payload).finalize().into_bytes();
        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        );

        IssuedToken { token, expires_at }
    }

    /// Check the signature and expiry of `token` at instant `now`.
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<AdminClaims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if signature.contains('.') {
            return Err(TokenError::Malformed);
        }
        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: AdminClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
        if claims.sub != ADMIN_SUBJECT {
            return Err(TokenError::Malformed);
        }
        if now.unix_timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Compare a submitted PIN with the expected one in constant time.
    ///
    /// Both values are keyed through the HMAC so inputs of different lengths
    /// are compared as equal-length tags.
    pub fn pin_matches(&self, provided: &str, expected: &str) -> bool {
        let expected_tag = self.mac(expected.as_bytes()).finalize().into_bytes();
        self.mac(provided.as_bytes())
            .verify_slice(&expected_tag)
            .is_ok()
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac
    }
}

/// Exchange the host's PIN for a signed admin token.
pub fn verify_pin(
    state: &SharedState,
    request: VerifyPinRequest,
) -> Result<VerifyPinResponse, ServiceError> {
    let expected = state
        .config()
        .admin
        .pin
        .as_deref()
        .ok_or_else(|| ServiceError::NotConfigured("admin PIN is not configured".into()))?;

    if !state.token_signer().pin_matches(request.pin.trim(), expected) {
        warn!("rejected admin PIN attempt");
        return Err(ServiceError::Unauthorized("invalid PIN".into()));
    }

    let issued = state.token_signer().issue(OffsetDateTime::now_utc());
    info!("admin PIN verified; issued token");
    Ok(VerifyPinResponse {
        token: issued.token,
        expires_at: format_system_time(issued.expires_at.into()),
    })
}

/// Validate a token presented on an admin route.
pub fn authorize(state: &SharedState, token: &str) -> Result<AdminClaims, ServiceError> {
    Ok(state
        .token_signer()
        .verify(token, OffsetDateTime::now_utc())?)
}
