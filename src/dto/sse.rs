use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::tv::{PopupView, TvSnapshotResponse};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Sent once when a TV display connects, describing what is on screen.
pub struct TvConnectedEvent(pub TvSnapshotResponse);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a popup becomes visible.
pub struct PopupShownEvent(pub PopupView);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the visible popup is taken down.
pub struct PopupHiddenEvent {
    /// Identifier of the popup that was hidden, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent when the host closes the TV session; the stream ends afterwards.
pub struct TvClosedEvent {
    pub party_code: String,
}
