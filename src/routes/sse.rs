use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/parties/{code}/tv",
    tag = "sse",
    params(("code" = String, Path, description = "Party code")),
    responses((status = 200, description = "TV popup stream", content_type = "text/event-stream", body = String))
)]
/// Stream popup show/hide transitions to a party's TV display.
pub async fn tv_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (party_code, receiver, snapshot) = sse_service::subscribe_tv(&state, &code)?;
    info!(party_code = %party_code, "New TV SSE connection");
    Ok(sse_service::to_tv_stream(
        state, party_code, receiver, snapshot,
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/parties/{code}/tv", get(tv_stream))
}
