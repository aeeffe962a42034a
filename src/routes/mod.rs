use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod sse;
pub mod tv;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(admin::router())
        .merge(sse::router())
        .merge(tv::router(state.clone()));

    let docs_router = docs::router();

    api_router.merge(docs_router).with_state(state)
}
