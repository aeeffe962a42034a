use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    routing::post,
};
use validator::Validate;

use crate::{
    dto::admin::{VerifyPinRequest, VerifyPinResponse},
    error::AppError,
    services::admin_auth,
    state::SharedState,
};

pub(crate) const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin authentication endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/admin/verify-pin", post(verify_pin))
}

/// Exchange the host's PIN for a signed admin token.
#[utoipa::path(
    post,
    path = "/admin/verify-pin",
    tag = "admin",
    request_body = VerifyPinRequest,
    responses(
        (status = 200, description = "PIN accepted", body = VerifyPinResponse),
        (status = 400, description = "Malformed PIN"),
        (status = 401, description = "Wrong PIN"),
        (status = 503, description = "No admin PIN configured")
    )
)]
pub async fn verify_pin(
    State(state): State<SharedState>,
    Json(payload): Json<VerifyPinRequest>,
) -> Result<Json<VerifyPinResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_auth::verify_pin(&state, payload)?))
}

/// Reject requests that do not carry a valid admin token.
pub(crate) async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    admin_auth::authorize(&state, provided)?;
    Ok(next.run(req).await)
}
