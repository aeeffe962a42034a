use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        sse::{PopupHiddenEvent, PopupShownEvent, ServerEvent, TvClosedEvent, TvConnectedEvent},
        tv::{PopupView, TvSnapshotResponse},
    },
    state::{ScorePopup, notification_queue::Notification},
};

const EVENT_TV_CONNECTED: &str = "tv.connected";
const EVENT_POPUP_SHOW: &str = "popup.show";
const EVENT_POPUP_HIDE: &str = "popup.hide";
const EVENT_TV_CLOSED: &str = "tv.closed";

/// First event on a TV stream, describing what is on screen right now.
pub fn tv_connected(snapshot: TvSnapshotResponse) -> Option<ServerEvent> {
    build_event(EVENT_TV_CONNECTED, &TvConnectedEvent(snapshot))
}

/// A popup became the visible one.
pub fn popup_shown(event: Notification<ScorePopup>) -> Option<ServerEvent> {
    build_event(EVENT_POPUP_SHOW, &PopupShownEvent(PopupView::from(event)))
}

/// The visible popup was taken down, either by its hold expiring or by a clear.
pub fn popup_hidden(id: Option<Uuid>) -> Option<ServerEvent> {
    build_event(EVENT_POPUP_HIDE, &PopupHiddenEvent { id })
}

/// The host closed the party's TV session.
pub fn tv_closed(party_code: &str) -> Option<ServerEvent> {
    build_event(
        EVENT_TV_CLOSED,
        &TvClosedEvent {
            party_code: party_code.to_string(),
        },
    )
}

fn build_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize TV SSE payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shown_event_carries_popup_fields() {
        let event = popup_shown(Notification::new(ScorePopup {
            player_name: "Jey".into(),
            points: 4,
            label: None,
        }))
        .unwrap();

        assert_eq!(event.event.as_deref(), Some("popup.show"));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["player_name"], "Jey");
        assert_eq!(data["points"], 4);
        assert!(data.get("label").is_none());
    }

    #[test]
    fn hidden_event_omits_unknown_id() {
        let event = popup_hidden(None).unwrap();
        assert_eq!(event.event.as_deref(), Some("popup.hide"));
        assert_eq!(event.data, "{}");
    }
}
