use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the party tracker TV backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::admin::verify_pin,
        crate::routes::tv::enqueue_popup,
        crate::routes::tv::clear_popups,
        crate::routes::tv::close_session,
        crate::routes::tv::get_snapshot,
        crate::routes::sse::tv_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::VerifyPinRequest,
            crate::dto::admin::VerifyPinResponse,
            crate::dto::tv::ScorePopupRequest,
            crate::dto::tv::EnqueueResponse,
            crate::dto::tv::EnqueueOutcome,
            crate::dto::tv::PopupView,
            crate::dto::tv::PopupPhase,
            crate::dto::tv::TvSnapshotResponse,
            crate::dto::sse::TvConnectedEvent,
            crate::dto::sse::PopupShownEvent,
            crate::dto::sse::PopupHiddenEvent,
            crate::dto::sse::TvClosedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Host authentication"),
        (name = "tv", description = "TV display popup queue"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
