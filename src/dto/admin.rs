//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// PIN typed by the host to unlock the scoring tools.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VerifyPinRequest {
    #[validate(length(min = 1, max = 32))]
    pub pin: String,
}

/// Signed admin token to send back in the `X-Admin-Token` header.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPinResponse {
    pub token: String,
    /// RFC 3339 expiry of the token.
    pub expires_at: String,
}
