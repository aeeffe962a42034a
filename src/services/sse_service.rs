use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{sse::ServerEvent, tv::TvSnapshotResponse},
    error::ServiceError,
    services::{sse_events, tv_service},
    state::{ScorePopup, SharedState, notification_queue::Notification},
};

type CurrentPopup = watch::Receiver<Option<Notification<ScorePopup>>>;

/// Attach a TV display to the party's popup queue, opening the session if needed.
///
/// Returns the canonical party code, the receiver for popup changes, and the
/// snapshot the display should render first. The receiver has already seen the
/// snapshot, so no transition between the two is lost.
pub fn subscribe_tv(
    state: &SharedState,
    raw_code: &str,
) -> Result<(String, CurrentPopup, TvSnapshotResponse), ServiceError> {
    let code = tv_service::party_code(raw_code)?;
    let (receiver, snapshot) = state.tv().open(&code).subscribe_with_snapshot();
    let snapshot = TvSnapshotResponse::new(code.clone(), snapshot);
    Ok((code, receiver, snapshot))
}

/// Convert the popup receiver into an SSE response, forwarding show/hide transitions
/// until the client disconnects or the session is closed.
///
/// On disconnect the session is released again unless it still has work or
/// other watchers.
pub fn to_tv_stream(
    state: SharedState,
    party_code: String,
    mut receiver: CurrentPopup,
    snapshot: TvSnapshotResponse,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        let shown: Option<Uuid> = snapshot.current.as_ref().map(|popup| popup.id);
        let delivered = match sse_events::tv_connected(snapshot) {
            Some(connected) => tx.send(Ok(to_sse_event(connected))).await.is_ok(),
            None => true,
        };
        if delivered {
            forward_transitions(&tx, &mut receiver, &party_code, shown).await;
        }

        drop(receiver);
        state.tv().release(&party_code);
        info!(party_code = %party_code, "TV SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn forward_transitions(
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    receiver: &mut CurrentPopup,
    party_code: &str,
    mut shown: Option<Uuid>,
) {
    loop {
        tokio::select! {
            _ = tx.closed() => return,
            changed = receiver.changed() => {
                if changed.is_err() {
                    // The queue was dropped: the host closed the session.
                    if let Some(closed) = sse_events::tv_closed(party_code) {
                        let _ = tx.send(Ok(to_sse_event(closed))).await;
                    }
                    return;
                }

                let current = receiver.borrow_and_update().clone();
                for payload in transition_events(&mut shown, current) {
                    if tx.send(Ok(to_sse_event(payload))).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Events moving the display from `shown` to `current`.
///
/// Watch updates coalesce, so a clear immediately followed by an enqueue can
/// arrive as a direct switch between two popups. The display still gets the
/// hide for the old popup before the show for the new one.
fn transition_events(
    shown: &mut Option<Uuid>,
    current: Option<Notification<ScorePopup>>,
) -> Vec<ServerEvent> {
    match current {
        Some(event) if *shown == Some(event.id) => Vec::new(),
        Some(event) => {
            let hide = shown
                .replace(event.id)
                .and_then(|id| sse_events::popup_hidden(Some(id)));
            hide.into_iter()
                .chain(sse_events::popup_shown(event))
                .collect()
        }
        None => match shown.take() {
            Some(id) => sse_events::popup_hidden(Some(id)).into_iter().collect(),
            None => Vec::new(),
        },
    }
}

fn to_sse_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
