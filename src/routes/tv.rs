use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
};
use validator::Validate;

use crate::{
    dto::tv::{EnqueueResponse, ScorePopupRequest, TvSnapshotResponse},
    error::AppError,
    routes::admin::require_admin_token,
    services::tv_service,
    state::SharedState,
};

/// TV display routes: host-only popup controls plus the public snapshot.
pub fn router(state: SharedState) -> Router<SharedState> {
    let host = Router::new()
        .route(
            "/parties/{code}/tv/popups",
            delete(clear_popups).post(enqueue_popup),
        )
        .route("/parties/{code}/tv/session", delete(close_session))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token));

    Router::new()
        .route("/parties/{code}/tv", get(get_snapshot))
        .merge(host)
}

/// Queue a score popup on the party's TV display.
#[utoipa::path(
    post,
    path = "/parties/{code}/tv/popups",
    tag = "tv",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by /admin/verify-pin"),
    ("code" = String, Path, description = "Party code")),
    request_body = ScorePopupRequest,
    responses(
        (status = 200, description = "Popup queued", body = EnqueueResponse),
        (status = 400, description = "Invalid popup or party code"),
        (status = 429, description = "Popup queue full")
    )
)]
pub async fn enqueue_popup(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<ScorePopupRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    payload.validate()?;
    Ok(Json(tv_service::enqueue_popup(&state, &code, payload)?))
}

/// Remove every pending and visible popup.
#[utoipa::path(
    delete,
    path = "/parties/{code}/tv/popups",
    tag = "tv",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by /admin/verify-pin"),
    ("code" = String, Path, description = "Party code")),
    responses((status = 204, description = "Popups cleared"), (status = 404, description = "No TV session"))
)]
pub async fn clear_popups(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    tv_service::clear_popups(&state, &code)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close the party's TV session.
#[utoipa::path(
    delete,
    path = "/parties/{code}/tv/session",
    tag = "tv",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by /admin/verify-pin"),
    ("code" = String, Path, description = "Party code")),
    responses((status = 204, description = "Session closed"), (status = 404, description = "No TV session"))
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    tv_service::close_session(&state, &code)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return what the party's TV should display right now.
#[utoipa::path(
    get,
    path = "/parties/{code}/tv",
    tag = "tv",
    params(("code" = String, Path, description = "Party code")),
    responses((status = 200, description = "Current TV state", body = TvSnapshotResponse))
)]
pub async fn get_snapshot(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<TvSnapshotResponse>, AppError> {
    Ok(Json(tv_service::snapshot(&state, &code)?))
}
