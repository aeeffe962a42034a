//! Sequential notification scheduler backing the TV score popups.
//!
//! Events are shown one at a time: each becomes the current value for the hold
//! duration, then the slot is emptied for the gap duration before the next
//! pending event is shown. Renderers observe the slot through a watch channel.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, SystemTime},
};

use serde::Deserialize;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, sleep, sleep_until},
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default time an event stays visible.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(2_500);
/// Default idle time between two visible events.
pub const DEFAULT_GAP: Duration = Duration::from_millis(500);

/// A single event awaiting display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification<T> {
    pub id: Uuid,
    pub payload: T,
    pub enqueued_at: SystemTime,
}

impl<T> Notification<T> {
    /// Wrap `payload` with a freshly generated identifier.
    pub fn new(payload: T) -> Self {
        Self::with_id(Uuid::new_v4(), payload)
    }

    /// Wrap `payload` keeping a caller-assigned identifier.
    pub fn with_id(id: Uuid, payload: T) -> Self {
        Self {
            id,
            payload,
            enqueued_at: SystemTime::now(),
        }
    }
}

/// What to do when `pending` already holds `max_depth` events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest pending event to make room.
    #[default]
    DropOldest,
    /// Refuse the new event.
    Reject,
}

/// Timing and capacity knobs for a [`NotificationQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub hold: Duration,
    pub gap: Duration,
    /// `None` leaves `pending` unbounded.
    pub max_depth: Option<usize>,
    pub overflow: OverflowPolicy,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            hold: DEFAULT_HOLD,
            gap: DEFAULT_GAP,
            max_depth: None,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Where the queue is inside its drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPhase {
    /// No cycle is running; `current` is empty.
    Idle,
    /// An event is visible and the hold timer is running.
    Showing,
    /// The slot is empty and the gap timer is running.
    Gap,
}

/// Result of [`NotificationQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// The queue was idle, so the event became current immediately.
    Showing,
    /// The event waits behind `position` others (0 means it is next).
    Queued { position: usize },
    /// The queue was full and the oldest pending event was discarded.
    DisplacedOldest { dropped: Uuid, position: usize },
    /// The queue was full and the event was refused.
    Rejected,
}

/// Point-in-time view of a queue.
#[derive(Debug, Clone)]
pub struct QueueSnapshot<T> {
    pub phase: DrainPhase,
    pub current: Option<Notification<T>>,
    pub pending: Vec<Notification<T>>,
}

struct QueueState<T> {
    pending: VecDeque<Notification<T>>,
    phase: DrainPhase,
    /// Bumped by `clear` so a continuation that already woke up becomes stale.
    epoch: u64,
    cycle: Option<JoinHandle<()>>,
}

struct Inner<T> {
    settings: QueueSettings,
    state: Mutex<QueueState<T>>,
    current: watch::Sender<Option<Notification<T>>>,
}

/// FIFO queue presenting one notification at a time with fixed hold and gap timing.
///
/// Must be used from within a Tokio runtime: starting a drain cycle spawns the task
/// that owns the timers. Dropping the queue cancels that task.
pub struct NotificationQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> NotificationQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle queue.
    pub fn new(settings: QueueSettings) -> Self {
        let (current, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                settings,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    phase: DrainPhase::Idle,
                    epoch: 0,
                    cycle: None,
                }),
                current,
            }),
        }
    }

    /// Settings the queue was created with.
    pub fn settings(&self) -> QueueSettings {
        self.inner.settings
    }

    /// Append `event` and start draining when idle. Never waits.
    pub fn enqueue(&self, event: Notification<T>) -> Enqueued {
        let mut state = self.inner.lock();
        let id = event.id;

        let mut dropped = None;
        if let Some(max_depth) = self.inner.settings.max_depth {
            if state.phase != DrainPhase::Idle && state.pending.len() >= max_depth {
                match self.inner.settings.overflow {
                    OverflowPolicy::Reject => {
                        warn!(%id, pending = state.pending.len(), "notification queue full; rejecting event");
                        return Enqueued::Rejected;
                    }
                    OverflowPolicy::DropOldest => {
                        dropped = state.pending.pop_front().map(|oldest| oldest.id);
                        if let Some(dropped) = dropped {
                            warn!(%dropped, %id, "notification queue full; dropping oldest event");
                        }
                    }
                }
            }
        }

        state.pending.push_back(event);

        if state.phase == DrainPhase::Idle {
            self.inner.start_cycle(&mut state);
            return Enqueued::Showing;
        }

        let position = state.pending.len() - 1;
        debug!(%id, position, "notification queued");
        match dropped {
            Some(dropped) => Enqueued::DisplacedOldest { dropped, position },
            None => Enqueued::Queued { position },
        }
    }

    /// The event that should be rendered right now, if any.
    pub fn current(&self) -> Option<Notification<T>> {
        self.inner.current.borrow().clone()
    }

    /// Observe changes of the current event.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification<T>>> {
        self.inner.current.subscribe()
    }

    /// Cancel the running cycle and discard every pending and visible event.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.epoch += 1;
        if let Some(cycle) = state.cycle.take() {
            cycle.abort();
        }
        let discarded = state.pending.len();
        state.pending.clear();
        state.phase = DrainPhase::Idle;
        self.inner.current.send_if_modified(|current| current.take().is_some());
        if discarded > 0 {
            debug!(discarded, "notification queue cleared");
        }
    }

    /// Current position in the drain cycle.
    pub fn phase(&self) -> DrainPhase {
        self.inner.lock().phase
    }

    /// True while a drain cycle is active (showing or in the gap).
    pub fn is_draining(&self) -> bool {
        self.phase() != DrainPhase::Idle
    }

    /// Number of events waiting behind the visible one.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Subscribe together with a snapshot taken under the same lock.
    ///
    /// The receiver has already seen the snapshot's `current`, so its next
    /// change notification is the first transition after the snapshot.
    pub fn subscribe_with_snapshot(
        &self,
    ) -> (watch::Receiver<Option<Notification<T>>>, QueueSnapshot<T>) {
        let state = self.inner.lock();
        let mut receiver = self.inner.current.subscribe();
        let current = receiver.borrow_and_update().clone();
        let snapshot = QueueSnapshot {
            phase: state.phase,
            current,
            pending: state.pending.iter().cloned().collect(),
        };
        (receiver, snapshot)
    }

    /// Number of live receivers observing the current slot.
    pub fn watcher_count(&self) -> usize {
        self.inner.current.receiver_count()
    }

    /// Consistent copy of phase, current event, and pending events.
    pub fn snapshot(&self) -> QueueSnapshot<T> {
        let state = self.inner.lock();
        QueueSnapshot {
            phase: state.phase,
            current: self.inner.current.borrow().clone(),
            pending: state.pending.iter().cloned().collect(),
        }
    }
}

impl<T> Drop for NotificationQueue<T> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.epoch += 1;
        if let Some(cycle) = state.cycle.take() {
            cycle.abort();
        }
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Show the head of `pending` and spawn the task driving the timers.
    ///
    /// Caller holds the lock and has checked the queue is idle.
    fn start_cycle(self: &Arc<Self>, state: &mut QueueState<T>) {
        if !self.show_head(state) {
            return;
        }
        let epoch = state.epoch;
        let shown_at = Instant::now();
        state.cycle = Some(tokio::spawn(run_cycle(Arc::clone(self), epoch, shown_at)));
    }

    fn show_head(&self, state: &mut QueueState<T>) -> bool {
        match state.pending.pop_front() {
            Some(next) => {
                debug!(id = %next.id, pending = state.pending.len(), "showing notification");
                state.phase = DrainPhase::Showing;
                self.current.send_replace(Some(next));
                true
            }
            None => {
                state.phase = DrainPhase::Idle;
                false
            }
        }
    }

    /// End the hold phase. Returns false when the cycle was cancelled.
    fn hide_current(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.phase = DrainPhase::Gap;
        self.current.send_replace(None);
        true
    }

    /// End the gap phase. Returns false when the cycle is over or was cancelled.
    fn advance(&self, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        if self.show_head(&mut state) {
            return true;
        }
        state.cycle = None;
        debug!("notification queue drained");
        false
    }
}

/// Drive one drain cycle. The first hold is measured from `shown_at` so the
/// delay before the task is first polled does not stretch it.
async fn run_cycle<T>(inner: Arc<Inner<T>>, epoch: u64, shown_at: Instant)
where
    T: Clone + Send + Sync + 'static,
{
    let QueueSettings { hold, gap, .. } = inner.settings;
    sleep_until(shown_at + hold).await;
    loop {
        if !inner.hide_current(epoch) {
            return;
        }
        sleep(gap).await;
        if !inner.advance(epoch) {
            return;
        }
        sleep(hold).await;
    }
}
