use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload including the number of open TV sessions.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let sessions = state.tv().len();
    debug!(sessions, "health check");
    HealthResponse::ok(sessions)
}
