//! DTOs for the TV display and the host's popup controls.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_system_time,
    state::{
        ScorePopup,
        notification_queue::{DrainPhase, Enqueued, Notification, QueueSnapshot},
    },
};

/// Score change pushed by the host's scoring flow.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScorePopupRequest {
    /// Optional caller-assigned identifier, e.g. the realtime row id.
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub player_name: String,
    /// Point delta, negative for deductions.
    pub points: i32,
    /// Optional caption such as the match or pick that scored.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub label: Option<String>,
}

impl From<ScorePopupRequest> for Notification<ScorePopup> {
    fn from(request: ScorePopupRequest) -> Self {
        let payload = ScorePopup {
            player_name: request.player_name,
            points: request.points,
            label: request.label,
        };
        match request.id {
            Some(id) => Notification::with_id(id, payload),
            None => Notification::new(payload),
        }
    }
}

/// Popup as rendered by the TV display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PopupView {
    pub id: Uuid,
    pub player_name: String,
    pub points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// RFC 3339 time the popup was queued.
    pub enqueued_at: String,
}

impl From<Notification<ScorePopup>> for PopupView {
    fn from(event: Notification<ScorePopup>) -> Self {
        Self {
            id: event.id,
            player_name: event.payload.player_name,
            points: event.payload.points,
            label: event.payload.label,
            enqueued_at: format_system_time(event.enqueued_at),
        }
    }
}

/// Drain cycle phase exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PopupPhase {
    Idle,
    Showing,
    Gap,
}

impl From<DrainPhase> for PopupPhase {
    fn from(phase: DrainPhase) -> Self {
        match phase {
            DrainPhase::Idle => PopupPhase::Idle,
            DrainPhase::Showing => PopupPhase::Showing,
            DrainPhase::Gap => PopupPhase::Gap,
        }
    }
}

/// How an enqueued popup was accepted.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// Displayed immediately.
    Showing,
    /// Waiting behind other popups.
    Queued,
    /// Queued after discarding the oldest waiting popup.
    DisplacedOldest,
}

/// Response returned when a popup is accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnqueueResponse {
    pub id: Uuid,
    pub outcome: EnqueueOutcome,
    /// Number of popups waiting ahead of this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Identifier of the popup discarded to make room, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped: Option<Uuid>,
}

impl EnqueueResponse {
    /// Build the response for `id`; `None` when the queue refused the popup.
    pub fn from_outcome(id: Uuid, enqueued: Enqueued) -> Option<Self> {
        let (outcome, position, dropped) = match enqueued {
            Enqueued::Showing => (EnqueueOutcome::Showing, None, None),
            Enqueued::Queued { position } => (EnqueueOutcome::Queued, Some(position), None),
            Enqueued::DisplacedOldest { dropped, position } => {
                (EnqueueOutcome::DisplacedOldest, Some(position), Some(dropped))
            }
            Enqueued::Rejected => return None,
        };
        Some(Self {
            id,
            outcome,
            position,
            dropped,
        })
    }
}

/// Current state of a party's TV display.
#[derive(Debug, Serialize, ToSchema)]
pub struct TvSnapshotResponse {
    pub party_code: String,
    pub phase: PopupPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<PopupView>,
    /// Number of popups waiting to be shown.
    pub pending: usize,
}

impl TvSnapshotResponse {
    /// Project a queue snapshot for clients.
    pub fn new(party_code: String, snapshot: QueueSnapshot<ScorePopup>) -> Self {
        Self {
            party_code,
            phase: snapshot.phase.into(),
            current: snapshot.current.map(PopupView::from),
            pending: snapshot.pending.len(),
        }
    }

    /// Snapshot for a party whose TV session is not open.
    pub fn idle(party_code: String) -> Self {
        Self {
            party_code,
            phase: PopupPhase::Idle,
            current: None,
            pending: 0,
        }
    }
}
