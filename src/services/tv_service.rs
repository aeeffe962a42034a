//! Host-driven popup operations and public projections of a party's TV display.

use tracing::{debug, info, warn};

use crate::{
    dto::{
        tv::{EnqueueResponse, ScorePopupRequest, TvSnapshotResponse},
        validation::normalize_party_code,
    },
    error::ServiceError,
    state::{ScorePopup, SharedState, notification_queue::Notification},
};

/// Validate and canonicalise a party code taken from the request path.
pub fn party_code(raw: &str) -> Result<String, ServiceError> {
    normalize_party_code(raw).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid party code".into()),
        )
    })
}

/// Queue a score popup on the party's TV, opening the session if needed.
pub fn enqueue_popup(
    state: &SharedState,
    raw_code: &str,
    request: ScorePopupRequest,
) -> Result<EnqueueResponse, ServiceError> {
    let code = party_code(raw_code)?;
    let event: Notification<ScorePopup> = request.into();
    let id = event.id;

    let queue = state.tv().open(&code);
    let outcome = queue.enqueue(event);
    debug!(party_code = %code, %id, ?outcome, "score popup enqueued");

    EnqueueResponse::from_outcome(id, outcome).ok_or_else(|| {
        warn!(party_code = %code, %id, "score popup rejected; queue full");
        ServiceError::QueueFull(code)
    })
}

/// Drop every pending and visible popup for the party.
pub fn clear_popups(state: &SharedState, raw_code: &str) -> Result<(), ServiceError> {
    let code = party_code(raw_code)?;
    let queue = state
        .tv()
        .get(&code)
        .ok_or_else(|| ServiceError::NotFound(format!("no TV session for party `{code}`")))?;
    queue.clear();
    info!(party_code = %code, "cleared TV popups");
    Ok(())
}

/// Close the party's TV session, stopping its timers and ending its streams.
pub fn close_session(state: &SharedState, raw_code: &str) -> Result<(), ServiceError> {
    let code = party_code(raw_code)?;
    if state.tv().close(&code) {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "no TV session for party `{code}`"
        )))
    }
}

/// Return what the party's TV should currently display.
pub fn snapshot(state: &SharedState, raw_code: &str) -> Result<TvSnapshotResponse, ServiceError> {
    let code = party_code(raw_code)?;
    Ok(match state.tv().get(&code) {
        Some(queue) => TvSnapshotResponse::new(code, queue.snapshot()),
        None => TvSnapshotResponse::idle(code),
    })
}
